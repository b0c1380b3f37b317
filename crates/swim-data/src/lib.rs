//! Data layer for the swim analyzer.
//!
//! Reads an Apple Health export, extracts swimming laps, segments them into
//! sets by rest gap, aggregates per-set statistics and writes the resulting
//! tables as CSV.

pub mod aggregator;
pub mod analysis;
pub mod extractor;
pub mod reader;
pub mod segmenter;
pub mod writer;

pub use swim_core as core;
