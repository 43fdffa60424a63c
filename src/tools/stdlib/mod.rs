//! Baseline reference libraries
//!
//! - `core`: `Math.*`, `String.*` and `Convert.*` helpers
//! - `dynamic`: record and JSON helpers over dynamic values
//! - `lucid`: the crate's own lambda utilities

pub mod core;
pub mod dynamic;
pub mod lucid;

use crate::error::{Error, Result};
use crate::runtime::Value;
use crate::tools::Library;

/// Builds the baseline libraries
pub fn baseline() -> Vec<Library> {
    vec![core::library(), dynamic::library(), lucid::library()]
}

/// Positional argument accessor shared by the baseline tools
pub(crate) fn arg<'a>(tool: &str, args: &'a [Value], index: usize) -> Result<&'a Value> {
    args.get(index).ok_or_else(|| Error::InvalidArguments {
        tool: tool.to_string(),
        reason: format!("Missing argument at position {}", index),
    })
}
