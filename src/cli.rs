use crate::error::{Error, Result};
use crate::models::{ConversionRequest, RENDER_SCALE, RenderSettings};
use clap::Parser;
use clap::error::ErrorKind as ClapErrorKind;
use std::ffi::OsString;
use std::num::NonZeroUsize;
use std::path::PathBuf;

pub const BIN_NAME: &str = "pdf-to-images";

pub fn usage_message() -> String {
    format!("Usage: {BIN_NAME} <pdf_path> <output_dir>")
}

/// Render every page of a PDF to PNG at 2x scale and report the result as JSON
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = BIN_NAME, version)]
pub struct Options {
    /// PDF document to rasterize
    pub pdf_path: PathBuf,

    /// Directory receiving page-1.png, page-2.png, ... (created if missing)
    pub output_dir: PathBuf,

    /// PNG encoder threads; 1 renders strictly sequentially, 0 uses every CPU
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Directory searched first for the PDFium shared library
    #[arg(long, value_name = "DIR")]
    pub pdfium_dir: Option<PathBuf>,

    /// Log more to stderr (-v info, -vv debug, -vvv trace); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// What a parse produced: either options to run with, or text clap already
/// wants printed (help/version).
#[derive(Debug)]
pub enum Parsed {
    Run(Options),
    Info(clap::Error),
}

/// Any argument mistake collapses into the one usage error; `--help` and
/// `--version` pass through untouched.
pub fn parse_from<I, T>(args: I) -> Result<Parsed>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Options::try_parse_from(args) {
        Ok(options) => Ok(Parsed::Run(options)),
        Err(e) if matches!(e.kind(), ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) => {
            Ok(Parsed::Info(e))
        }
        Err(e) => {
            tracing::debug!(error = %e, "rejected arguments");
            Err(Error::usage(usage_message()))
        }
    }
}

impl Options {
    pub fn request(&self) -> ConversionRequest {
        ConversionRequest::new(&self.pdf_path, &self.output_dir)
    }

    pub fn settings(&self) -> RenderSettings {
        RenderSettings {
            scale: RENDER_SCALE,
            jobs: resolve_jobs(self.jobs),
            library_dir: self.pdfium_dir.clone(),
        }
    }

    pub const fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn resolve_jobs(jobs: usize) -> usize {
    if jobs == 0 {
        std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
    } else {
        jobs
    }
}
