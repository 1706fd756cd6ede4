use crate::error::{Error, Result};
use crate::models::PageImage;
use image::{ImageFormat, RgbImage};
use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| Error::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// `<dir>/page-{index + 1}.png`
pub fn page_image_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("page-{}.png", index + 1))
}

/// Encode `raster` as PNG next to its final name, then rename it into place.
///
/// Readers never see a half-written page, and a rerun replaces the old file.
pub fn write_page(dir: &Path, index: usize, raster: &RgbImage) -> Result<PageImage> {
    let path = page_image_path(dir, index);
    write_png(&path, raster).map_err(|source| Error::Write {
        path: path.clone(),
        source,
    })?;
    Ok(PageImage { index, path })
}

/// Writes `raster` to `path` through a sibling `.png.tmp` file.
pub fn write_png(path: &Path, raster: &RgbImage) -> std::result::Result<(), image::ImageError> {
    let tmp_path = path.with_extension("png.tmp");

    let written = (|| {
        let file = fs::File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        raster.write_to(&mut writer, ImageFormat::Png)?;
        let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok::<(), image::ImageError>(())
    })();

    if written.is_err() {
        if let Err(e) = fs::remove_file(&tmp_path) {
            debug!(path = %tmp_path.display(), error = %e, "temp file not removed");
        }
    }
    written
}
