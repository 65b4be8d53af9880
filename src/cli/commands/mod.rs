pub mod config;
pub mod plan;
pub mod run;

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputMode {
    #[default]
    Text,
    Json,
}
