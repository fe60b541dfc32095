//! Bundle Parser (C5) and Bundle Transpiler (C6): scene manifest JSON to
//! resolved script bindings, and batch-transpiling those bindings.

mod parser;
mod transpiler;

pub use parser::{validate, ManifestJsonError, ParsedBundle, RegionStats, ScriptBinding, ValidationError};
pub use transpiler::{derive_class_name, transpile_bundle, TranspiledBundle, TranspiledScript};

pub use parser::parse as parse_manifest;
