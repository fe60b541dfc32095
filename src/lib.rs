//! LSL-to-TSL transpiler and sandboxed world-script runtime.
//!
//! Two subsystems, wired together by the [`bundle`] pipeline:
//!
//! - A source-to-source transpiler ([`lexer`] -> [`parser`] -> [`codegen`],
//!   fronted by [`facade::transpile`]) lowering legacy LSL scripts to TSL.
//! - A sandboxed script runtime ([`runtime`]) that loads TSL scripts,
//!   isolates them, dispatches world events to them, and brokers their
//!   outbound API calls to the host engine.

pub mod ast;
pub mod bundle;
pub mod codegen;
pub mod config;
pub mod facade;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod sandbox;
