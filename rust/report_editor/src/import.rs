//! Turning a picked file into a document value.

use crate::config::EditorConfig;
use crate::convert::DocxToHtml;
use crate::error::Result;
use crate::json_html::json_to_html;
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Kind of file an import reads, decided by extension (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSource {
    Text,
    Docx,
    Json,
}

impl ImportSource {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(ImportSource::Text),
            "docx" => Some(ImportSource::Docx),
            "json" => Some(ImportSource::Json),
            _ => None,
        }
    }
}

/// The picker a file was chosen from. Each picker accepts its own extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportControl {
    /// `.txt` and `.docx`.
    Document,
    /// `.json`.
    Json,
}

impl ImportControl {
    pub fn accepts(self, source: ImportSource) -> bool {
        match self {
            ImportControl::Document => matches!(source, ImportSource::Text | ImportSource::Docx),
            ImportControl::Json => source == ImportSource::Json,
        }
    }

    pub fn accepts_path(self, path: &Path) -> bool {
        ImportSource::from_path(path).is_some_and(|source| self.accepts(source))
    }

    /// The picker that accepts `path`, if any.
    pub fn for_path(path: &Path) -> Option<Self> {
        match ImportSource::from_path(path)? {
            ImportSource::Json => Some(ImportControl::Json),
            _ => Some(ImportControl::Document),
        }
    }
}

/// HTML for an imported `.json` file. Text that is not JSON, or JSON with no
/// renderable sections or table, comes back as plain text.
pub fn json_import_html(text: &str, config: &EditorConfig) -> String {
    match json_to_html(text, config.locale) {
        Ok(html) => html,
        Err(err) => {
            warn!("JSON import fell back to plain text: {err}");
            config.plain_text.apply(text)
        }
    }
}

/// Reads `path` and produces the new document value.
///
/// Returns `Ok(None)` when the file's extension is not one `control` accepts.
pub fn load(
    path: &Path,
    control: ImportControl,
    config: &EditorConfig,
    docx: &dyn DocxToHtml,
) -> Result<Option<String>> {
    let Some(source) = ImportSource::from_path(path).filter(|s| control.accepts(*s)) else {
        debug!("Ignoring {} for the {:?} picker", path.display(), control);
        return Ok(None);
    };

    let html = match source {
        ImportSource::Text => {
            let text = fs::read_to_string(path)?;
            debug!("Read {} bytes of text from {}", text.len(), path.display());
            config.plain_text.apply(&text)
        }
        ImportSource::Docx => {
            let bytes = fs::read(path)?;
            debug!("Read {} bytes of docx from {}", bytes.len(), path.display());
            docx.to_html(&bytes)?
        }
        ImportSource::Json => {
            let text = fs::read_to_string(path)?;
            json_import_html(&text, config)
        }
    };
    Ok(Some(html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlainTextPolicy;
    use crate::error::EditorError;
    use std::io::Write;

    struct FixedDocx(&'static str);

    impl DocxToHtml for FixedDocx {
        fn to_html(&self, _docx: &[u8]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingDocx;

    impl DocxToHtml for FailingDocx {
        fn to_html(&self, _docx: &[u8]) -> Result<String> {
            Err(EditorError::EmptyDocument)
        }
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        path
    }

    #[test]
    fn sources_by_extension() {
        assert_eq!(ImportSource::from_path(Path::new("a.TXT")), Some(ImportSource::Text));
        assert_eq!(ImportSource::from_path(Path::new("a.Docx")), Some(ImportSource::Docx));
        assert_eq!(ImportSource::from_path(Path::new("a.json")), Some(ImportSource::Json));
        assert_eq!(ImportSource::from_path(Path::new("a.pdf")), None);
        assert_eq!(ImportSource::from_path(Path::new("README")), None);
    }

    #[test]
    fn pickers_accept_their_own_files() {
        assert!(ImportControl::Document.accepts(ImportSource::Text));
        assert!(ImportControl::Document.accepts(ImportSource::Docx));
        assert!(!ImportControl::Document.accepts(ImportSource::Json));
        assert!(ImportControl::Json.accepts(ImportSource::Json));
        assert!(!ImportControl::Json.accepts(ImportSource::Text));
        assert!(ImportControl::Json.accepts_path(Path::new("r.JSON")));
        assert!(!ImportControl::Document.accepts_path(Path::new("r.json")));
        assert_eq!(ImportControl::for_path(Path::new("x.json")), Some(ImportControl::Json));
        assert_eq!(ImportControl::for_path(Path::new("x.txt")), Some(ImportControl::Document));
    }

    #[test]
    fn text_is_escaped_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "notes.txt", b"a <b> c");
        let config = EditorConfig::default();
        let html = load(&path, ImportControl::Document, &config, &FixedDocx("")).unwrap();
        assert_eq!(html.as_deref(), Some("a &lt;b&gt; c"));

        let verbatim = EditorConfig {
            plain_text: PlainTextPolicy::Verbatim,
            ..EditorConfig::default()
        };
        let html = load(&path, ImportControl::Document, &verbatim, &FixedDocx("")).unwrap();
        assert_eq!(html.as_deref(), Some("a <b> c"));
    }

    #[test]
    fn plain_text_is_byte_for_byte() {
        let dir = tempfile::tempdir().unwrap();
        let text = "سلام دنیا\nsecond line\n";
        let path = write_file(&dir, "fa.txt", text.as_bytes());
        let html = load(&path, ImportControl::Document, &EditorConfig::default(), &FixedDocx("")).unwrap();
        assert_eq!(html.as_deref(), Some(text));
    }

    #[test]
    fn quotes_and_apostrophes_import_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let text = "it's \"done\"\n";
        let path = write_file(&dir, "q.txt", text.as_bytes());
        let html = load(&path, ImportControl::Document, &EditorConfig::default(), &FixedDocx("")).unwrap();
        assert_eq!(html.as_deref(), Some(text));
    }

    #[test]
    fn docx_goes_through_the_converter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "r.docx", b"PK");
        let html = load(
            &path,
            ImportControl::Document,
            &EditorConfig::default(),
            &FixedDocx("<p>converted</p>"),
        )
        .unwrap();
        assert_eq!(html.as_deref(), Some("<p>converted</p>"));

        let err = load(&path, ImportControl::Document, &EditorConfig::default(), &FailingDocx);
        assert!(err.is_err());
    }

    #[test]
    fn wrong_picker_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let json = write_file(&dir, "r.json", b"{}");
        let pdf = write_file(&dir, "r.pdf", b"%PDF");
        let config = EditorConfig::default();
        assert_eq!(load(&json, ImportControl::Document, &config, &FixedDocx("")).unwrap(), None);
        assert_eq!(load(&pdf, ImportControl::Json, &config, &FixedDocx("")).unwrap(), None);
    }

    #[test]
    fn invalid_json_falls_back_to_text() {
        let config = EditorConfig::default();
        assert_eq!(json_import_html("{not valid", &config), "{not valid");
        assert_eq!(json_import_html(r#"{"a": 1}"#, &config), r#"{"a": 1}"#);
    }

    #[test]
    fn json_file_renders_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "r.json", br#"{"first": {"A": "x"}}"#);
        let html = load(&path, ImportControl::Json, &EditorConfig::default(), &FixedDocx(""))
            .unwrap()
            .unwrap();
        assert!(html.contains("<h2 dir=\"rtl\""));
        assert!(html.contains(">A</h2>"));
        assert!(html.contains(">x</p>"));
    }
}
