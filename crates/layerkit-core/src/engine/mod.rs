//! The analysis engine: layer detection, primitive-cell reduction, periodic
//! bond enumeration, and scalar-field hotspot extraction.
//!
//! Every entry point is a pure function of its inputs: one structure or field
//! plus an explicit configuration object. Nothing here holds state between
//! invocations, so independent analyses are safe to run in parallel.

pub mod bonds;
pub mod config;
pub mod error;
pub mod hotspots;
pub mod layers;
pub mod primitive;
