//! Provides the foundational layer of the library.
//!
//! This module contains the stateless data models shared by every analysis,
//! the file I/O implementations for the supported plain-text formats, and
//! low-level periodic-geometry utilities.

pub mod io;
pub mod models;
pub mod utils;
