#[macro_use]
mod macros;
mod parse;
pub use parse::{parse, Error};
pub mod ast;

/// File extension of package manifests.
pub const MANIFEST_EXT: &str = "vtpkg";
