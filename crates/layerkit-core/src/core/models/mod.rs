//! Defines the core data models for crystal-structure analysis.
//!
//! All entities here are derived, read-only value objects: they are
//! constructed once per input file and never mutated by the analysis engine.

pub mod atom;
pub mod field;
pub mod lattice;
pub mod structure;
