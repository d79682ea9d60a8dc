pub mod analysis;
pub mod api;
pub mod config;
pub mod document_processor;
pub mod models;
pub mod processing;
pub mod utils;
pub mod validation;

pub use config::Config;
pub use document_processor::DocumentProcessor;
