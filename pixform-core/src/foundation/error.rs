use std::path::PathBuf;

/// Convenience result type used across pixform.
pub type PixformResult<T> = Result<T, PixformError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum PixformError {
    /// Source image, parameter file or output path could not be read, decoded or written.
    #[error("io error on '{}': {reason}", .path.display())]
    InputIo {
        /// File the operation was touching.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },

    /// No built-in and no dynamic module matches the requested name.
    #[error("plugin '{name}' not found (searched: {})", display_dirs(.searched))]
    PluginNotFound {
        /// Requested plugin name.
        name: String,
        /// Directories that were searched after the built-in table.
        searched: Vec<PathBuf>,
    },

    /// A module was found but violates the plugin ABI contract.
    #[error("plugin '{name}' is incompatible: {reason}")]
    PluginIncompatible {
        /// Requested plugin name.
        name: String,
        /// Which part of the contract was violated.
        reason: String,
    },

    /// The dynamic loader could not open the module.
    #[error("failed to load plugin library '{}': {reason}", .path.display())]
    PluginLoadFailed {
        /// Library file that was opened.
        path: PathBuf,
        /// Loader diagnostic.
        reason: String,
    },

    /// A dynamic plugin reported a runtime failure.
    #[error("plugin '{name}' failed: {reason}")]
    PluginExecution {
        /// Plugin name.
        name: String,
        /// Decoded status.
        reason: String,
    },

    /// The parameter document is not well-formed JSON.
    #[error("malformed parameter document at line {line}, column {column}: {message}")]
    ParamParse {
        /// 1-based line of the syntax error.
        line: usize,
        /// 1-based column of the syntax error.
        column: usize,
        /// Parser diagnostic.
        message: String,
    },

    /// The parameter document does not satisfy the plugin schema.
    #[error("invalid parameter '{field}': {reason}")]
    ParamSchema {
        /// Offending field, or `$` for the document root.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A kernel received a configuration the binder should have rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// `width * height * 4` cannot be addressed or allocated.
    #[error("image dimensions {width}x{height} overflow the addressable buffer size")]
    DimensionOverflow {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Image buffer invariants do not hold (zero size, store length mismatch).
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

impl PixformError {
    /// Build a [`PixformError::InputIo`] value.
    pub fn input_io(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::InputIo {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`PixformError::PluginIncompatible`] value.
    pub fn incompatible(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PluginIncompatible {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`PixformError::ParamSchema`] value.
    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParamSchema {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`PixformError::InvalidConfiguration`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Build a [`PixformError::InvalidImage`] value.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    if dirs.is_empty() {
        return "built-ins only".to_string();
    }
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
