//! Token budget for one enrichment batch

/// Budget configuration and tracking
#[derive(Debug, Clone)]
pub struct Budget {
    /// Total tokens available for the batch
    pub total_tokens: u32,
    /// Tokens reported used so far
    pub tokens_used: u32,
    /// Completion cap sent with each request
    pub max_tokens_per_request: u32,
}

impl Budget {
    pub fn new(total_tokens: u32, max_tokens_per_request: u32) -> Self {
        Self {
            total_tokens,
            tokens_used: 0,
            max_tokens_per_request,
        }
    }

    /// Check if there's enough budget left for an estimated token cost
    pub fn has_budget(&self, estimated_tokens: u32) -> bool {
        self.tokens_used.saturating_add(estimated_tokens) <= self.total_tokens
    }

    /// Record token usage
    pub fn use_tokens(&mut self, tokens: u32) {
        self.tokens_used = self.tokens_used.saturating_add(tokens);
    }

    pub fn remaining(&self) -> u32 {
        self.total_tokens.saturating_sub(self.tokens_used)
    }

    /// Worst-case cost of one request: ~4 prompt characters per token plus the full
    /// completion cap.
    pub fn estimate_request(&self, prompt_chars: usize) -> u32 {
        u32::try_from(prompt_chars / 4)
            .unwrap_or(u32::MAX)
            .saturating_add(self.max_tokens_per_request)
    }
}
