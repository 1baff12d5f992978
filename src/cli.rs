use clap::{Parser, ValueEnum};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    /// Human-readable output for local development.
    Pretty,
    /// Newline-delimited JSON for log aggregation.
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "bloom", about = "Video discovery API server")]
pub struct Args {
    /// Tracing output format.
    #[arg(long, value_enum, default_value = "pretty")]
    pub tracing: TracingFormat,
}
