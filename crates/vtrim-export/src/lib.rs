//! Timeline export.
//!
//! Turns a final segment list plus sequence metadata into an FCP7/xmeml
//! interchange document. Formatting is a pure function: identical inputs
//! always produce byte-identical output.

pub mod xmeml;

pub use xmeml::{
    create_xml_from_segments, export_file_name, ExportArtifact, ExportSettings, FieldOrder,
    PixelAspectRatio, SequenceMeta,
};
