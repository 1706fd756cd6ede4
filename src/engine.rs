use crate::error::{Error, Result};
use crate::models::{ConversionRequest, ConversionResult, PageImage, RenderSettings};
use crate::pdf_engine::{self, Rasterizer};
use crate::storage;
use tracing::{info, warn};

/// Rejects requests whose input does not exist. Runs before anything is
/// created on disk.
pub fn preflight(request: &ConversionRequest) -> Result<()> {
    if request.pdf_path.exists() {
        Ok(())
    } else {
        Err(Error::NotFound(request.pdf_path.clone()))
    }
}

/// Renders every page of `request.pdf_path` into `request.output_dir`.
///
/// Does not check that the input exists; see [`preflight`]. Files written
/// before a failure are left in place and not reported.
pub fn try_rasterize(
    request: &ConversionRequest,
    settings: &RenderSettings,
) -> Result<Vec<PageImage>> {
    storage::ensure_output_dir(&request.output_dir)?;

    let pdfium = pdf_engine::pdfium(settings.library_dir.as_deref())?;
    Rasterizer::new(pdfium, settings.scale).rasterize(
        &request.pdf_path,
        &request.output_dir,
        settings.jobs,
    )
}

pub fn rasterize(request: &ConversionRequest, settings: &RenderSettings) -> ConversionResult {
    match try_rasterize(request, settings) {
        Ok(images) => {
            info!(
                pages = images.len(),
                output_dir = %request.output_dir.display(),
                "conversion finished"
            );
            ConversionResult::succeeded(&images)
        }
        Err(e) => {
            warn!(kind = ?e.kind(), error = %e, "conversion failed");
            ConversionResult::failed(&e)
        }
    }
}

/// Preflight followed by [`rasterize`].
pub fn run(request: &ConversionRequest, settings: &RenderSettings) -> ConversionResult {
    match preflight(request) {
        Ok(()) => rasterize(request, settings),
        Err(e) => e.into(),
    }
}
