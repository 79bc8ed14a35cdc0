//! The rich-text surface the toolbar drives.
//!
//! The editing widget itself lives outside this crate; [`RichTextSurface`] is
//! the slice of its API the toolbar needs. [`HtmlSurface`] keeps the value as
//! an HTML string and is what the command-line front end and the tests use.

use crate::escape::escape_html;

/// A cursor position, counted in visible characters (an embed counts as one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub index: usize,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Embed {
    /// An image source, usually a data URL.
    Image(String),
}

impl Embed {
    pub fn to_html(&self) -> String {
        match self {
            Embed::Image(src) => format!("<img src=\"{}\">", escape_html(src)),
        }
    }
}

/// Attributes of the surface's root content container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RootContainer {
    pub dir: Option<String>,
    pub text_align: Option<String>,
}

pub trait RichTextSurface {
    fn value(&self) -> &str;

    fn set_value(&mut self, html: String);

    fn selection(&self) -> Option<Selection>;

    fn set_selection(&mut self, selection: Selection);

    fn insert_embed(&mut self, index: usize, embed: Embed);

    fn root_mut(&mut self) -> &mut RootContainer;

    fn root(&self) -> &RootContainer;
}

#[derive(Debug, Clone, Default)]
pub struct HtmlSurface {
    html: String,
    selection: Option<Selection>,
    root: RootContainer,
}

impl HtmlSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

fn find_tag_end(s: &str, lt: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = lt;
    let mut in_s = false;
    let mut in_d = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' if !in_d => in_s = !in_s,
            b'"' if !in_s => in_d = !in_d,
            b'>' if !in_s && !in_d => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Byte offset in `html` at which the `index`-th visible character starts.
/// Tags take no room except `<img>`, which counts as one character; an entity
/// counts as one character. Past the end, the end of the string is returned.
pub fn byte_offset_for_index(html: &str, index: usize) -> usize {
    let bytes = html.as_bytes();
    let mut seen = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        if seen == index && bytes[i] != b'<' {
            return i;
        }
        match bytes[i] {
            b'<' => {
                let Some(gt) = find_tag_end(html, i) else {
                    return html.len();
                };
                let is_img = html[i + 1..gt]
                    .trim_start()
                    .get(..3)
                    .is_some_and(|name| name.eq_ignore_ascii_case("img"));
                if is_img {
                    if seen == index {
                        return i;
                    }
                    seen += 1;
                }
                i = gt + 1;
            }
            b'&' => {
                let end = html[i..].find(';').filter(|&n| n <= 10);
                i += end.map(|n| n + 1).unwrap_or(1);
                seen += 1;
            }
            _ => {
                let ch_len = html[i..].chars().next().map(char::len_utf8).unwrap_or(1);
                i += ch_len;
                seen += 1;
            }
        }
    }
    html.len()
}

impl RichTextSurface for HtmlSurface {
    fn value(&self) -> &str {
        &self.html
    }

    fn set_value(&mut self, html: String) {
        self.html = html;
        self.selection = None;
    }

    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    fn insert_embed(&mut self, index: usize, embed: Embed) {
        let at = byte_offset_for_index(&self.html, index);
        self.html.insert_str(at, &embed.to_html());
    }

    fn root_mut(&mut self) -> &mut RootContainer {
        &mut self.root
    }

    fn root(&self) -> &RootContainer {
        &self.root
    }
}
