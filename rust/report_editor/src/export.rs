//! Packaging the document value as a Word file.

use crate::controller::Direction;
use crate::convert::HtmlToDocx;
use crate::error::Result;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Wraps the document value in a minimal HTML shell. The body content is
/// verbatim; the document direction lands on the `<body>` element.
pub fn wrap_document(value: &str, direction: Direction) -> String {
    let body = match direction {
        Direction::Ltr => "<body>",
        Direction::Rtl => "<body dir=\"rtl\" style=\"text-align: right;\">",
    };
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head>{}{}</body></html>",
        body, value
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportedDocument {
    /// Writes the document into `dir` under its file name.
    pub fn save_into(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        info!("Saved {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

pub fn export_document(
    value: &str,
    direction: Direction,
    writer: &dyn HtmlToDocx,
    file_name: &str,
) -> Result<ExportedDocument> {
    let html = wrap_document(value, direction);
    let bytes = writer.to_docx(&html)?;
    info!("Exported {} bytes of html as {} ({} bytes)", value.len(), file_name, bytes.len());
    Ok(ExportedDocument {
        file_name: file_name.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditorError;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<String>>,
    }

    impl HtmlToDocx for Recorder {
        fn to_docx(&self, html: &str) -> Result<Vec<u8>> {
            self.seen.borrow_mut().push(html.to_string());
            Ok(b"DOCX".to_vec())
        }
    }

    struct Broken;

    impl HtmlToDocx for Broken {
        fn to_docx(&self, _html: &str) -> Result<Vec<u8>> {
            Err(EditorError::EmptyDocument)
        }
    }

    #[test]
    fn shell_declares_utf8_and_keeps_body() {
        let value = "<p dir=\"rtl\">سلام &amp; <b>x</b></p>";
        let html = wrap_document(value, Direction::Ltr);
        assert_eq!(
            html,
            format!("<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body>{value}</body></html>")
        );
    }

    #[test]
    fn rtl_direction_marks_the_body() {
        let html = wrap_document("<p>x</p>", Direction::Rtl);
        assert!(html.contains("<body dir=\"rtl\" style=\"text-align: right;\"><p>x</p></body>"));
    }

    #[test]
    fn export_passes_wrapped_value_to_writer() {
        let writer = Recorder::default();
        let doc = export_document("<p>x</p>", Direction::Ltr, &writer, "document.docx").unwrap();
        assert_eq!(doc.file_name, "document.docx");
        assert_eq!(doc.bytes, b"DOCX");
        assert_eq!(writer.seen.borrow()[0], wrap_document("<p>x</p>", Direction::Ltr));
    }

    #[test]
    fn writer_failure_propagates() {
        assert!(export_document("<p>x</p>", Direction::Ltr, &Broken, "document.docx").is_err());
    }

    #[test]
    fn save_into_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let doc = ExportedDocument {
            file_name: "report.docx".to_string(),
            bytes: vec![1, 2, 3],
        };
        let path = doc.save_into(&dir.path().join("out")).unwrap();
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("report.docx"));
        assert_eq!(fs::read(path).unwrap(), vec![1, 2, 3]);
    }
}
