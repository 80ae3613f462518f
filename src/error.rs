use std::path::PathBuf;

use thiserror::Error;

pub type CrosswordResult<T> = Result<T, CrosswordError>;

/// Fatal problems with the puzzle inputs or outputs. An unsatisfiable puzzle is not an error; see
/// `FillFailure` for that.
#[derive(Error, Debug)]
pub enum CrosswordError {
    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("the structure has no rows")]
    EmptyStructure,
    #[error("structure row {row} has {actual} cells, expected {expected}")]
    RaggedStructure {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unexpected character '{character}' at row {row}, column {col} of the structure")]
    InvalidCell { row: usize, col: usize, character: char },
}

impl CrosswordError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read { path: path.into(), source }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write { path: path.into(), source }
    }
}
