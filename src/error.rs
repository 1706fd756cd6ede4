//! Error handling for the rasterizer

use pdfium_render::prelude::PdfiumError;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit status for a run that produced `success: true`.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status when the request was rejected before any conversion work.
pub const EXIT_PREFLIGHT: i32 = 1;
/// Exit status when the conversion itself failed.
pub const EXIT_CONVERSION: i32 = 2;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Usage(String),
    #[error("PDF file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("PDFium library unavailable: {message} (searched: {})", display_paths(.searched))]
    Library {
        message: String,
        searched: Vec<PathBuf>,
    },
    #[error("Failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to open PDF {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: PdfiumError,
    },
    #[error("Failed to render page {page}: {source}")]
    Render {
        /// 1-based, as it appears in file names
        page: usize,
        #[source]
        source: PdfiumError,
    },
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Machine-readable category of a failure, carried in the JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Usage,
    NotFound,
    Library,
    OutputDir,
    Open,
    Render,
    Write,
}

impl ErrorKind {
    /// Usage and not-found are caught before the document is touched.
    pub const fn is_preflight(self) -> bool {
        matches!(self, Self::Usage | Self::NotFound)
    }

    pub const fn exit_code(self) -> i32 {
        if self.is_preflight() {
            EXIT_PREFLIGHT
        } else {
            EXIT_CONVERSION
        }
    }
}

impl Error {
    pub fn usage<S: Into<String>>(msg: S) -> Self {
        Self::Usage(msg.into())
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Usage(_) => ErrorKind::Usage,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Library { .. } => ErrorKind::Library,
            Self::OutputDir { .. } => ErrorKind::OutputDir,
            Self::Open { .. } => ErrorKind::Open,
            Self::Render { .. } => ErrorKind::Render,
            Self::Write { .. } => ErrorKind::Write,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "system library path".to_string();
    }
    let mut joined: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    joined.push("system library path".to_string());
    joined.join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;
