//! # LayerKit Core Library
//!
//! An analysis library for layered-crystal simulation workflows. It stages
//! simulation inputs and post-processes two kinds of simulation outputs:
//! interatomic bonding geometry and electron-localization-like scalar fields.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict layered architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`Lattice`,
//!   `Structure`, `ScalarField`), file I/O for positional and volumetric
//!   formats, and periodic-geometry utilities.
//!
//! - **[`engine`]: The Logic Core.** Implements the structural/field analysis
//!   algorithms: layer and vacuum-gap detection, primitive-cell reduction,
//!   periodic bond enumeration with deduplication, and greedy hotspot
//!   extraction under a minimum-separation constraint. Every entry point is a
//!   pure function of a structure/field plus an explicit configuration object.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   It ties the `engine` and `core` together to analyze files and directories
//!   and to render the resulting reports.
//!
//! - **[`staging`]: Input Preparation.** Builds layered slab structures from a
//!   prototype, renders scheduler job scripts from templates, and stages run
//!   directories for an external simulator. No physics is computed here.

pub mod core;
pub mod engine;
pub mod staging;
pub mod workflows;
