use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Linear scale applied to both page axes before rasterization.
///
/// PDF user space is 72 units per inch, so this lands around 144 DPI.
pub const RENDER_SCALE: f32 = 2.0;

/// One invocation's input, built from the two positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub pdf_path: PathBuf,
    pub output_dir: PathBuf,
}

impl ConversionRequest {
    pub fn new(pdf_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            pdf_path: pdf_path.into(),
            output_dir: output_dir.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub scale: f32,
    /// Encoder workers. 1 keeps the whole run on the calling thread.
    pub jobs: usize,
    /// Searched before any of the default PDFium locations.
    pub library_dir: Option<PathBuf>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            scale: RENDER_SCALE,
            jobs: 1,
            library_dir: None,
        }
    }
}

/// A page written to disk as `page-{n}.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 0-based page index in the source document
    pub index: usize,
    pub path: PathBuf,
}

impl PageImage {
    pub const fn number(&self) -> usize {
        self.index + 1
    }
}

/// The single JSON object printed per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_paths: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ConversionResult {
    pub fn succeeded(images: &[PageImage]) -> Self {
        let image_paths: Vec<String> = images
            .iter()
            .map(|img| img.path.to_string_lossy().into_owned())
            .collect();
        Self {
            success: true,
            pages: Some(image_paths.len()),
            image_paths: Some(image_paths),
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(error: &Error) -> Self {
        Self {
            success: false,
            pages: None,
            image_paths: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }

    /// Process exit status matching this result.
    pub fn exit_code(&self) -> i32 {
        match self.error_kind {
            Some(kind) => kind.exit_code(),
            None if self.success => crate::error::EXIT_SUCCESS,
            None => crate::error::EXIT_CONVERSION,
        }
    }

    pub fn to_json(&self) -> String {
        // Plain struct of strings, numbers and bools; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"error":"failed to encode result: {e}"}}"#)
        })
    }
}

impl From<Error> for ConversionResult {
    fn from(error: Error) -> Self {
        Self::failed(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(index: usize, path: &str) -> PageImage {
        PageImage {
            index,
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn test_success_payload_shape() {
        let result =
            ConversionResult::succeeded(&[page(0, "out/page-1.png"), page(1, "out/page-2.png")]);
        insta::assert_json_snapshot!(result, @r###"
        {
          "success": true,
          "pages": 2,
          "image_paths": [
            "out/page-1.png",
            "out/page-2.png"
          ]
        }
        "###);
    }

    #[test]
    fn test_failure_payload_shape() {
        let result = ConversionResult::failed(&Error::NotFound(PathBuf::from("a.pdf")));
        insta::assert_json_snapshot!(result, @r###"
        {
          "success": false,
          "error": "PDF file not found: a.pdf",
          "error_kind": "not_found"
        }
        "###);
    }

    #[test]
    fn test_json_is_single_line() {
        let result = ConversionResult::succeeded(&[page(0, "x/page-1.png")]);
        let json = result.to_json();
        assert!(!json.contains('\n'));
        let parsed: ConversionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_pages_matches_paths() {
        let images: Vec<PageImage> = (0..5)
            .map(|i| page(i, &format!("o/page-{}.png", i + 1)))
            .collect();
        let result = ConversionResult::succeeded(&images);
        assert_eq!(result.pages, Some(5));
        assert_eq!(result.image_paths.as_ref().map(Vec::len), Some(5));
    }

    #[test]
    fn test_zero_pages_still_succeeds() {
        let result = ConversionResult::succeeded(&[]);
        assert!(result.success);
        assert_eq!(result.pages, Some(0));
        assert_eq!(result.to_json(), r#"{"success":true,"pages":0,"image_paths":[]}"#);
    }

    #[test]
    fn test_exit_code_reflects_success() {
        assert_eq!(ConversionResult::succeeded(&[]).exit_code(), 0);
        assert_eq!(
            ConversionResult::failed(&Error::usage("Usage: x")).exit_code(),
            1
        );
        let write = Error::Write {
            path: PathBuf::from("o/page-3.png"),
            source: image::ImageError::IoError(std::io::Error::other("disk full")),
        };
        assert_eq!(ConversionResult::from(write).exit_code(), 2);
    }

    #[test]
    fn test_default_settings_are_sequential_2x() {
        let settings = RenderSettings::default();
        assert!((settings.scale - 2.0).abs() < f32::EPSILON);
        assert_eq!(settings.jobs, 1);
        assert!(settings.library_dir.is_none());
    }

    #[test]
    fn test_page_number_is_one_based() {
        assert_eq!(page(0, "p").number(), 1);
        assert_eq!(page(9, "p").number(), 10);
    }
}
