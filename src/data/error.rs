use std::path::PathBuf;

use thiserror::Error;

/// Broad failure class of a [`LoadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input file is missing or unreadable.
    FileAccess,
    /// The file was read but its sheet or shape does not match.
    Format,
}

/// Errors raised while turning a report file into a table.
///
/// Every variant is fatal for the load that produced it.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("cannot read {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    #[error("header row {header_row} is past the last row ({rows} rows in sheet)")]
    HeaderRowOutOfRange { header_row: usize, rows: usize },

    #[error("expected {expected} columns, found {found}")]
    ColumnCountMismatch { expected: usize, found: usize },

    #[error("malformed input: {0}")]
    Malformed(String),
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::FileNotFound(_) | LoadError::FileAccess { .. } => ErrorKind::FileAccess,
            _ => ErrorKind::Format,
        }
    }

    pub(crate) fn malformed(msg: impl std::fmt::Display) -> Self {
        LoadError::Malformed(msg.to_string())
    }
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;
