//! Renders each page of a PDF to `page-{n}.png` at 2x scale through PDFium
//! and describes the outcome as a single JSON object.

pub mod cli;
pub mod engine;
pub mod error;
pub mod models;
pub mod pdf_engine;
pub mod storage;

pub use engine::{preflight, rasterize, run, try_rasterize};
pub use error::{Error, ErrorKind, Result};
pub use models::{ConversionRequest, ConversionResult, PageImage, RENDER_SCALE, RenderSettings};
