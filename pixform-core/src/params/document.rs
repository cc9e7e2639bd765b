use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::foundation::error::{PixformError, PixformResult};

/// Untyped parameter tree as loaded from disk.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamDocument {
    value: Value,
    source: Option<PathBuf>,
}

impl ParamDocument {
    /// Parse JSON bytes. Syntax errors surface as [`PixformError::ParamParse`].
    pub fn from_slice(bytes: &[u8]) -> PixformResult<Self> {
        let value = serde_json::from_slice(bytes).map_err(|e| PixformError::ParamParse {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        })?;
        Ok(Self {
            value,
            source: None,
        })
    }

    /// Read and parse a parameter file.
    #[tracing::instrument]
    pub fn read(path: &Path) -> PixformResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| PixformError::input_io(path, e))?;
        let mut doc = Self::from_slice(&bytes)?;
        doc.source = Some(path.to_path_buf());
        Ok(doc)
    }

    /// Wrap an already-parsed value.
    pub fn from_value(value: Value) -> Self {
        Self {
            value,
            source: None,
        }
    }

    /// Root of the tree.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// File the document was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/params/document.rs"]
mod tests;
