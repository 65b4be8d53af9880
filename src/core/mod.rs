pub mod config;
pub mod paths;

pub use config::{BlastConfig, Config, ErrorStrategy, PipelineConfig, SearchType, TaxidFilter};
