//! Shared types for the simulator.

use clap::ValueEnum;

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// One game per line, streamed as games finish.
    Jsonl,
    /// A single JSON array written when the run completes.
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum MetricsLevel {
    Basic,
    /// Adds a per-week trace of every role.
    Detailed,
}
