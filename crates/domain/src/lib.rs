//! Firehose Transformer Domain Models

/// Glue catalog model and collaborator trait
pub mod catalog;

/// Table classification custom resource
pub mod classification;

/// Domain errors
pub mod errors;

/// Delivery pipeline planner
pub mod pipeline;

/// Streaming worker bootstrap and deployment
pub mod reader;

pub use errors::Error;
