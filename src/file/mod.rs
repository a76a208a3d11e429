//! Binary I/O primitives shared by the `.rsrc` and BAML codecs.
//!
//! This module provides the low-level reading and writing infrastructure the format
//! engines are built on:
//!
//! - [`crate::file::parser::Parser`] - Cursor-based, bounds-checked binary reader
//! - [`crate::file::writer::Writer`] - Growable little-endian writer with back-patching
//! - [`crate::file::io`] - Endian conversion primitives shared by both

pub mod io;
pub mod parser;
pub mod writer;

pub use parser::Parser;
pub use writer::Writer;
