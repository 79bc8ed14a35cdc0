//! Report editor core: file import (text, Word, JSON reports), image
//! embedding, document direction and Word export for a rich-text surface.

pub mod config;
pub mod controller;
pub mod convert;
pub mod docx_export;
pub mod docx_import;
pub mod error;
pub mod escape;
pub mod export;
pub mod image;
pub mod import;
pub mod json_html;
pub mod surface;

pub use config::{EditorConfig, Locale, PlainTextPolicy};
pub use controller::{Direction, ImportStatus, ImportTicket, Toolbar};
pub use convert::{DocxToHtml, HtmlToDocx};
pub use docx_export::{html_to_docx, DocxWriter};
pub use docx_import::{docx_to_html, DocxReader};
pub use error::{EditorError, Result};
pub use export::{export_document, wrap_document, ExportedDocument};
pub use import::{ImportControl, ImportSource};
pub use json_html::{json_to_html, ReportDocument};
pub use surface::{HtmlSurface, RichTextSurface};
