use crate::error::{Error, Result};
use crate::models::PageImage;
use crate::storage;
use crossbeam_channel::{Receiver, bounded};
use directories::ProjectDirs;
use image::RgbImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

struct SharedPdfium(Pdfium);

// SAFETY: pdfium-render is built with `thread_safe`, so every call into the
// library goes through its global lock. Documents never leave the thread that
// opened them; only owned rasters cross threads.
unsafe impl Send for SharedPdfium {}
unsafe impl Sync for SharedPdfium {}

#[derive(Debug, Clone)]
struct BindFailure {
    message: String,
    searched: Vec<PathBuf>,
}

static PDFIUM: OnceLock<std::result::Result<SharedPdfium, BindFailure>> = OnceLock::new();

/// Process-wide PDFium handle, bound on first use.
///
/// The outcome of the first bind is cached, so `library_dir` only matters on
/// the first call.
pub fn pdfium(library_dir: Option<&Path>) -> Result<&'static Pdfium> {
    match PDFIUM.get_or_init(|| bind_pdfium(library_dir)) {
        Ok(shared) => Ok(&shared.0),
        Err(failure) => Err(Error::Library {
            message: failure.message.clone(),
            searched: failure.searched.clone(),
        }),
    }
}

/// Directories probed for the PDFium shared library, in order. The system
/// library path is tried after all of these.
pub fn library_search_paths(library_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(dir) = library_dir {
        paths.push(dir.to_path_buf());
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            paths.push(exe_dir.to_path_buf());
            paths.push(exe_dir.join("libs"));
        }
    }

    paths.push(PathBuf::from("./"));

    if let Some(dirs) = ProjectDirs::from("", "", "pdf-to-images") {
        paths.push(dirs.data_dir().to_path_buf());
    }

    paths
}

fn bind_pdfium(library_dir: Option<&Path>) -> std::result::Result<SharedPdfium, BindFailure> {
    let searched = library_search_paths(library_dir);

    for dir in &searched {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(dir);
        debug!(path = %lib_path.display(), "trying PDFium");

        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            info!(dir = %dir.display(), "PDFium bound");
            return Ok(SharedPdfium(Pdfium::new(bindings)));
        }
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            info!("PDFium bound from system library path");
            Ok(SharedPdfium(Pdfium::new(bindings)))
        }
        Err(e) => {
            warn!(error = %e, "PDFium library not found");
            Err(BindFailure {
                message: e.to_string(),
                searched,
            })
        }
    }
}

/// Renders every page of a document to `page-{n}.png`.
pub struct Rasterizer<'a> {
    pdfium: &'a Pdfium,
    scale: f32,
}

impl<'a> Rasterizer<'a> {
    pub const fn new(pdfium: &'a Pdfium, scale: f32) -> Self {
        Self { pdfium, scale }
    }

    pub fn open(&self, path: &Path) -> Result<PdfDocument<'a>> {
        self.pdfium
            .load_pdf_from_file(path, None)
            .map_err(|source| Error::Open {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn render_page(&self, page: &PdfPage, index: usize) -> Result<RgbImage> {
        let render_config = PdfRenderConfig::new().scale_page_by_factor(self.scale);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|source| Error::Render {
                page: index + 1,
                source,
            })?;

        let raster = bitmap.as_image().into_rgb8();

        debug!(
            page = index + 1,
            width_pt = page.width().value,
            height_pt = page.height().value,
            width_px = raster.width(),
            height_px = raster.height(),
            "page rendered"
        );

        Ok(raster)
    }

    /// Opens `pdf_path` and writes one PNG per page into `output_dir`.
    ///
    /// Pages are rendered lazily, in order, on this thread; see [`write_pages`]
    /// for how `jobs` spreads the encoding. The document is closed when this
    /// returns, error or not.
    pub fn rasterize(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        jobs: usize,
    ) -> Result<Vec<PageImage>> {
        let document = self.open(pdf_path)?;
        let page_count = usize::from(document.pages().len());

        info!(
            path = %pdf_path.display(),
            pages = page_count,
            jobs,
            "document opened"
        );

        let rasters = document
            .pages()
            .iter()
            .enumerate()
            .map(|(index, page)| (index, self.render_page(&page, index)));

        write_pages(rasters, page_count, output_dir, jobs)
    }
}

type Raster = (usize, Result<RgbImage>);
type WorkerOutput = (Vec<PageImage>, Vec<(usize, PathBuf, image::ImageError)>);

const NO_FAILURE: usize = usize::MAX;

/// Writes each `(index, raster)` to `page-{index + 1}.png`, stopping at the
/// first failure.
///
/// `jobs` is capped at `page_count`. Above one worker, PNG encoding runs on
/// scoped threads fed through a bounded queue while the caller's thread keeps
/// pulling rasters. Pages written before a failure stay on disk, and the
/// failure with the lowest page index is the one returned.
fn write_pages<I>(
    rasters: I,
    page_count: usize,
    output_dir: &Path,
    jobs: usize,
) -> Result<Vec<PageImage>>
where
    I: Iterator<Item = Raster>,
{
    let workers = jobs.min(page_count);
    if workers > 1 {
        write_pooled(rasters, output_dir, workers)
    } else {
        write_sequential(rasters, output_dir)
    }
}

fn write_sequential<I>(rasters: I, output_dir: &Path) -> Result<Vec<PageImage>>
where
    I: Iterator<Item = Raster>,
{
    let mut images = Vec::with_capacity(rasters.size_hint().0);

    for (index, raster) in rasters {
        let image = storage::write_page(output_dir, index, &raster?)?;
        debug!(page = image.number(), path = %image.path.display(), "page written");
        images.push(image);
    }

    Ok(images)
}

fn write_pooled<I>(mut rasters: I, output_dir: &Path, workers: usize) -> Result<Vec<PageImage>>
where
    I: Iterator<Item = Raster>,
{
    let (tx, rx) = bounded::<(usize, RgbImage)>(workers);
    // lowest page index that failed so far
    let first_failure = AtomicUsize::new(NO_FAILURE);

    let outcome = std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let rx = rx.clone();
            let first_failure = &first_failure;
            let spawned = std::thread::Builder::new()
                .name(format!("png-writer-{id}"))
                .spawn_scoped(scope, move || {
                    encode_pages(&rx, output_dir, first_failure)
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    warn!(
                        requested = workers,
                        started = handles.len(),
                        error = %e,
                        "PNG writer did not start"
                    );
                    break;
                }
            }
        }
        drop(rx);

        if handles.is_empty() {
            return None;
        }

        let mut errors = Vec::new();
        while first_failure.load(Ordering::Acquire) == NO_FAILURE {
            let Some((index, raster)) = rasters.next() else {
                break;
            };
            match raster {
                Ok(raster) => {
                    if tx.send((index, raster)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    first_failure.fetch_min(index, Ordering::AcqRel);
                    errors.push((index, e));
                }
            }
        }
        drop(tx);

        let mut images = Vec::new();
        for handle in handles {
            let (written, failures) = handle
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            images.extend(written);
            errors.extend(
                failures
                    .into_iter()
                    .map(|(index, path, source)| (index, Error::Write { path, source })),
            );
        }
        Some((images, errors))
    });

    let Some((mut images, errors)) = outcome else {
        return write_sequential(rasters, output_dir);
    };

    if let Some((_, first)) = errors.into_iter().min_by_key(|(index, _)| *index) {
        return Err(first);
    }

    images.sort_by_key(|image| image.index);
    Ok(images)
}

fn encode_pages(
    rx: &Receiver<(usize, RgbImage)>,
    output_dir: &Path,
    first_failure: &AtomicUsize,
) -> WorkerOutput {
    let mut written = Vec::new();
    let mut failures = Vec::new();

    for (index, raster) in rx {
        // keep draining so the producer never blocks on a stalled pool
        if index > first_failure.load(Ordering::Acquire) {
            continue;
        }
        let path = storage::page_image_path(output_dir, index);
        match storage::write_png(&path, &raster) {
            Ok(()) => {
                let image = PageImage { index, path };
                debug!(page = image.number(), path = %image.path.display(), "page written");
                written.push(image);
            }
            Err(source) => {
                warn!(page = index + 1, error = %source, "page write failed");
                first_failure.fetch_min(index, Ordering::AcqRel);
                failures.push((index, path, source));
            }
        }
    }

    (written, failures)
}
