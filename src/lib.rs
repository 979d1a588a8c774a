//! Reshape the eight TIC survey tables into a star schema: a region
//! dimension, a variable/response dimension and a fact table.

pub mod config;
pub mod dimension;
pub mod error;
pub mod fact;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod store;
pub mod tidy;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, RunSummary};
