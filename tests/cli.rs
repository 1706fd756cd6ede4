//! End-to-end checks of the `pdf-to-images` binary's JSON contract and exit
//! codes. None of these need the PDFium library to be installed.

use pdf_to_images::{ConversionResult, ErrorKind};
use std::process::{Command, Output};

fn run<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    Command::new(env!("CARGO_BIN_EXE_pdf-to-images"))
        .args(args)
        .output()
        .expect("failed to launch pdf-to-images")
}

fn payload(output: &Output) -> ConversionResult {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.trim_end();
    assert_eq!(line.lines().count(), 1, "stdout should be one JSON line: {stdout:?}");
    serde_json::from_str(line).unwrap_or_else(|e| panic!("bad JSON {line:?}: {e}"))
}

mod usage {
    use super::*;

    fn assert_usage(args: &[&str]) {
        let output = run(args);
        assert_eq!(output.status.code(), Some(1), "args: {args:?}");

        let result = payload(&output);
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Usage));
        let error = result.error.unwrap();
        assert!(error.starts_with("Usage: "), "{error}");
        assert!(error.ends_with("<pdf_path> <output_dir>"), "{error}");
        assert!(result.pages.is_none());
        assert!(result.image_paths.is_none());
    }

    #[test]
    fn test_no_arguments() {
        assert_usage(&[]);
    }

    #[test]
    fn test_one_argument() {
        assert_usage(&["doc.pdf"]);
    }

    #[test]
    fn test_three_arguments() {
        assert_usage(&["doc.pdf", "out", "extra"]);
    }

    #[test]
    fn test_help_exits_cleanly() {
        let output = run(["--help"]);
        assert_eq!(output.status.code(), Some(0));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("<PDF_PATH>"));
        assert!(stdout.contains("--jobs"));
    }
}

mod preflight {
    use super::*;

    #[test]
    fn test_missing_pdf_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nowhere.pdf");
        let out_dir = tmp.path().join("out");

        let output = run([missing.as_os_str(), out_dir.as_os_str()]);
        assert_eq!(output.status.code(), Some(1));

        let result = payload(&output);
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::NotFound));
        assert_eq!(
            result.error.as_deref(),
            Some(format!("PDF file not found: {}", missing.display()).as_str())
        );
        assert!(!out_dir.exists(), "rejected runs must not create the output dir");
    }
}

mod conversion_failure {
    use super::*;

    #[test]
    fn test_corrupt_pdf_is_reported_in_payload() {
        let tmp = tempfile::tempdir().unwrap();
        let corrupt = tmp.path().join("corrupt.pdf");
        std::fs::write(&corrupt, b"this is not a pdf").unwrap();
        let out_dir = tmp.path().join("out");

        let output = run([corrupt.as_os_str(), out_dir.as_os_str()]);
        assert_eq!(output.status.code(), Some(2));

        let result = payload(&output);
        assert!(!result.success);
        assert!(!result.error.unwrap_or_default().is_empty());
        assert!(matches!(
            result.error_kind,
            Some(ErrorKind::Open | ErrorKind::Library)
        ));
        // the directory is created before the document is opened
        assert!(out_dir.is_dir());
    }

    #[test]
    fn test_unwritable_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let pdf = tmp.path().join("doc.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"file, not dir").unwrap();

        let out_dir = blocker.join("out");

        let output = run([pdf.as_path(), out_dir.as_path()]);
        assert_eq!(output.status.code(), Some(2));

        let result = payload(&output);
        assert_eq!(result.error_kind, Some(ErrorKind::OutputDir));
    }

    #[test]
    fn test_logs_stay_off_stdout() {
        let tmp = tempfile::tempdir().unwrap();
        let corrupt = tmp.path().join("corrupt.pdf");
        std::fs::write(&corrupt, b"garbage").unwrap();

        let output = Command::new(env!("CARGO_BIN_EXE_pdf-to-images"))
            .arg("-vvv")
            .arg(&corrupt)
            .arg(tmp.path().join("out"))
            .output()
            .unwrap();

        // payload() asserts exactly one JSON line
        let result = payload(&output);
        assert!(!result.success);
        assert!(!output.stderr.is_empty());
    }
}
