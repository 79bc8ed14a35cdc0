use crate::error::Result;

/// Turns a Word document into an HTML fragment.
pub trait DocxToHtml {
    fn to_html(&self, docx: &[u8]) -> Result<String>;
}

/// Turns a full HTML document into a Word document.
pub trait HtmlToDocx {
    fn to_docx(&self, html: &str) -> Result<Vec<u8>>;
}
