//! BAML (compiled markup) document engine.
//!
//! Merged libraries carry their styles and templates as compiled markup streams. After
//! a merge those streams live inside the primary assembly, so every reference that
//! named a library by assembly must be redirected, and the primary's generic theme must
//! pull in the libraries' dictionaries so their styles stay reachable.
//!
//! # Architecture
//!
//! - [`records`] - The record-level codec: [`records::BamlDocument`] over an ordered
//!   [`records::BamlRecord`] sequence, with raw round-tripping for uninterpreted kinds
//! - [`generator`] - Synthesizes a `themes/generic` document from scratch
//! - [`patcher`] - Patches an existing theme document and rewrites cross-assembly
//!   references record by record
//!
//! # Key Components
//!
//! - [`generator::generate_generic_theme`] - Deterministic theme manifest generation
//! - [`patcher::ThemePatcher`] - Merged-dictionary insertion into existing themes
//! - [`patcher::BamlRewriter`] - Assembly/xmlns/pack-URI reference collapsing
//! - [`patch_path`] - The pure path-rewriting rule both sides share

pub mod generator;
pub mod patcher;
pub mod records;

pub use generator::{generate_generic_theme, to_pack_uri};
pub use patcher::{patch_path, BamlRewriter, ThemePatcher};
pub use records::{BamlDocument, BamlRecord, BamlRecordKind, BamlVersion};

/// The default WPF presentation xml namespace.
pub const XMLNS_PRESENTATION: &str = "http://schemas.microsoft.com/winfx/2006/xaml/presentation";

/// Known-type id of `ResourceDictionary` (the two's complement encoding of -620).
pub const TYPE_RESOURCE_DICTIONARY: u16 = 0xFD94;

/// Known-type id used as the converter for URI-valued properties.
pub const TYPE_URI_CONVERTER: u16 = 0xFD34;

/// Framework assemblies eligible for assembly-info records in generated themes.
pub const WPF_FRAMEWORK_ASSEMBLIES: [&str; 3] =
    ["WindowsBase", "PresentationCore", "PresentationFramework"];
