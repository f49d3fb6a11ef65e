// Interview sessions: question sequencing, answer scoring, aggregation.

pub mod aggregate;
pub mod categories;
pub mod engine;
pub mod evaluation;
pub mod handlers;
pub mod prompts;
pub mod questions;
