//! Summarization bridge for SpecGraph
//!
//! Attaches short natural-language summaries to graph nodes through a pluggable
//! [`Summarizer`] backend, and explains individual changes on demand.

pub mod bridge;
pub mod budget;
pub mod enrich;
pub mod prompt;
pub mod providers;


pub use bridge::*;
pub use budget::Budget;
pub use enrich::{enrich_graph, EnrichReport, EnrichmentOptions};
pub use providers::create_summarizer;
