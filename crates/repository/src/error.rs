use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Template(#[from] askama::Error),

    #[error("{} in {}: not valid UTF-8", .entry, .archive.display())]
    InvalidUtf8 { archive: PathBuf, entry: String },
}

pub type Result<T> = std::result::Result<T, Error>;
