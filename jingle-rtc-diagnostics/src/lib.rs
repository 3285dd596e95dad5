//! # jingle-rtc Diagnostics
//!
//! Debugging and diagnostic tools for jingle-rtc.
//! Provides the per-connection call trace, trace analysis, and structured logging.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod debug_logger;
pub mod trace;
pub mod trace_analyzer;

// Re-export main types
pub use debug_logger::DebugLogger;
pub use trace::{TraceEntry, TraceKind, TraceLog, TraceSink};
pub use trace_analyzer::{TraceAnalyzer, TraceSummary};
