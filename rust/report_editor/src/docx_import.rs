//! DOCX → HTML.
//!
//! Streams `word/document.xml` with quick-xml and emits a plain HTML fragment:
//! headings, paragraphs, bullet lists, bold/italic/underline/strike runs,
//! external hyperlinks, tables and embedded pictures (as data URLs).
//! Paragraphs marked `w:bidi` carry `dir="rtl"`. Empty paragraphs are dropped.

use crate::convert::DocxToHtml;
use crate::error::{EditorError, Result};
use crate::escape::escape_html;
use crate::image::{data_url, mime_for_path};
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

#[derive(Debug, Clone)]
struct Relationship {
    target: String,
    external: bool,
}

fn read_zip_text<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut out = String::new();
    file.read_to_string(&mut out)?;
    Ok(Some(out))
}

fn read_zip_bytes<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<Vec<u8>> {
    let mut file = archive.by_name(name).ok()?;
    let mut out = Vec::new();
    file.read_to_end(&mut out).ok()?;
    Some(out)
}

fn attr_value(e: &BytesStart, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

// Toggle properties (`<w:b/>`, `<w:b w:val="0"/>`) are on unless explicitly off.
fn toggle_on(e: &BytesStart) -> bool {
    !matches!(
        attr_value(e, b"val").as_deref(),
        Some("0") | Some("false") | Some("off") | Some("none")
    )
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, Relationship>> {
    let mut reader = Reader::from_str(xml);
    let mut out = HashMap::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let (Some(id), Some(target)) = (attr_value(&e, b"Id"), attr_value(&e, b"Target")) else {
                    continue;
                };
                let external = attr_value(&e, b"TargetMode")
                    .is_some_and(|m| m.eq_ignore_ascii_case("external"));
                out.insert(id, Relationship { target, external });
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

/// Part path of a relationship target relative to `word/`.
fn word_part_path(target: &str) -> String {
    let t = target.trim_start_matches('/');
    if t.starts_with("word/") {
        t.to_string()
    } else {
        format!("word/{}", t.trim_start_matches("./"))
    }
}

#[derive(Debug, Default)]
struct RunState {
    bold: bool,
    italic: bool,
    underline: bool,
    strike: bool,
    text: String,
}

impl RunState {
    fn into_html(self) -> String {
        if self.text.is_empty() {
            return String::new();
        }
        let mut open = String::new();
        let mut close = String::new();
        for (on, tag) in [
            (self.bold, "strong"),
            (self.italic, "em"),
            (self.underline, "u"),
            (self.strike, "s"),
        ] {
            if on {
                open.push_str(&format!("<{tag}>"));
                close.insert_str(0, &format!("</{tag}>"));
            }
        }
        format!("{open}{}{close}", self.text)
    }
}

#[derive(Debug, Default)]
struct ParagraphState {
    heading: Option<u8>,
    list_item: bool,
    rtl: bool,
    html: String,
    has_content: bool,
}

#[derive(Debug, Default)]
struct Container {
    html: String,
    list_open: bool,
}

impl Container {
    fn close_list(&mut self) {
        if self.list_open {
            self.html.push_str("</ul>");
            self.list_open = false;
        }
    }
}

fn heading_level(style_id: &str) -> Option<u8> {
    let lower = style_id.to_ascii_lowercase();
    if lower == "title" {
        return Some(1);
    }
    let rest = lower.strip_prefix("heading")?.trim();
    match rest.parse::<u8>() {
        Ok(n @ 1..=6) => Some(n),
        _ => None,
    }
}

struct HtmlBuilder<'a, R: Read + Seek> {
    archive: &'a mut ZipArchive<R>,
    rels: HashMap<String, Relationship>,
    containers: Vec<Container>,
    paragraph: Option<ParagraphState>,
    run: Option<RunState>,
    in_run_props: bool,
    in_text: bool,
    hyperlink_depth: Vec<bool>,
}

impl<'a, R: Read + Seek> HtmlBuilder<'a, R> {
    fn new(archive: &'a mut ZipArchive<R>, rels: HashMap<String, Relationship>) -> Self {
        Self {
            archive,
            rels,
            containers: vec![Container::default()],
            paragraph: None,
            run: None,
            in_run_props: false,
            in_text: false,
            hyperlink_depth: Vec::new(),
        }
    }

    fn container(&mut self) -> &mut Container {
        if self.containers.is_empty() {
            self.containers.push(Container::default());
        }
        let last = self.containers.len() - 1;
        &mut self.containers[last]
    }

    fn push_inline(&mut self, html: &str) {
        if let Some(p) = self.paragraph.as_mut() {
            p.html.push_str(html);
        }
    }

    fn picture_html(&mut self, rid: &str) -> Option<String> {
        let rel = self.rels.get(rid)?.clone();
        if rel.external {
            return Some(format!("<img src=\"{}\">", escape_html(&rel.target)));
        }
        let path = word_part_path(&rel.target);
        let bytes = read_zip_bytes(self.archive, &path)?;
        let mime = mime_for_path(Path::new(&path));
        Some(format!("<img src=\"{}\">", data_url(mime, &bytes)))
    }

    fn open(&mut self, e: &BytesStart) {
        match e.local_name().as_ref() {
            b"p" => {
                self.paragraph = Some(ParagraphState::default());
            }
            b"pStyle" => {
                let level = attr_value(e, b"val").and_then(|v| heading_level(&v));
                if let Some(p) = self.paragraph.as_mut() {
                    p.heading = level;
                }
            }
            b"numPr" => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.list_item = true;
                }
            }
            b"bidi" => {
                let on = toggle_on(e);
                if let Some(p) = self.paragraph.as_mut() {
                    p.rtl = on;
                }
            }
            b"r" => {
                self.run = Some(RunState::default());
            }
            b"rPr" => {
                self.in_run_props = self.run.is_some();
            }
            b"b" | b"i" | b"strike" | b"dstrike" if self.in_run_props => {
                let on = toggle_on(e);
                if let Some(run) = self.run.as_mut() {
                    match e.local_name().as_ref() {
                        b"b" => run.bold = on,
                        b"i" => run.italic = on,
                        _ => run.strike = on,
                    }
                }
            }
            b"u" if self.in_run_props => {
                let on = toggle_on(e);
                if let Some(run) = self.run.as_mut() {
                    run.underline = on;
                }
            }
            b"t" => {
                self.in_text = self.run.is_some();
            }
            b"br" | b"cr" => {
                if let Some(run) = self.run.as_mut() {
                    run.text.push_str("<br>");
                }
                if let Some(p) = self.paragraph.as_mut() {
                    p.has_content = true;
                }
            }
            b"tab" if self.run.is_some() => {
                if let Some(run) = self.run.as_mut() {
                    run.text.push('\t');
                }
            }
            b"blip" => {
                let Some(rid) = attr_value(e, b"embed").or_else(|| attr_value(e, b"link")) else {
                    return;
                };
                match self.picture_html(&rid) {
                    Some(img) => {
                        if let Some(run) = self.run.as_mut() {
                            run.text.push_str(&img);
                        } else {
                            self.push_inline(&img);
                        }
                        if let Some(p) = self.paragraph.as_mut() {
                            p.has_content = true;
                        }
                    }
                    None => debug!("docx picture {rid} has no readable media part"),
                }
            }
            b"hyperlink" => {
                let href = attr_value(e, b"id")
                    .and_then(|rid| self.rels.get(&rid).cloned())
                    .filter(|rel| rel.external)
                    .map(|rel| rel.target);
                match href {
                    Some(href) => {
                        self.push_inline(&format!("<a href=\"{}\">", escape_html(&href)));
                        self.hyperlink_depth.push(true);
                    }
                    None => self.hyperlink_depth.push(false),
                }
            }
            b"tbl" => {
                self.container().close_list();
                self.container().html.push_str("<table>");
            }
            b"tr" => self.container().html.push_str("<tr>"),
            b"tc" => self.containers.push(Container::default()),
            _ => {}
        }
    }

    fn close(&mut self, local: &[u8]) {
        match local {
            b"t" => self.in_text = false,
            b"rPr" => self.in_run_props = false,
            b"r" => {
                if let Some(run) = self.run.take() {
                    if !run.text.trim().is_empty() {
                        if let Some(p) = self.paragraph.as_mut() {
                            p.has_content = true;
                        }
                    }
                    let html = run.into_html();
                    self.push_inline(&html);
                }
                self.in_run_props = false;
            }
            b"hyperlink" => {
                if self.hyperlink_depth.pop() == Some(true) {
                    self.push_inline("</a>");
                }
            }
            b"p" => {
                let Some(p) = self.paragraph.take() else {
                    return;
                };
                if !p.has_content {
                    return;
                }
                let dir = if p.rtl { " dir=\"rtl\"" } else { "" };
                let container = self.container();
                if p.list_item && p.heading.is_none() {
                    if !container.list_open {
                        container.html.push_str("<ul>");
                        container.list_open = true;
                    }
                    container.html.push_str(&format!("<li{dir}>{}</li>", p.html));
                } else {
                    container.close_list();
                    let tag = match p.heading {
                        Some(level) => format!("h{level}"),
                        None => "p".to_string(),
                    };
                    container.html.push_str(&format!("<{tag}{dir}>{}</{tag}>", p.html));
                }
            }
            b"tc" => {
                if self.containers.len() > 1 {
                    let mut cell = self.containers.pop().unwrap_or_default();
                    cell.close_list();
                    self.container().html.push_str(&format!("<td>{}</td>", cell.html));
                }
            }
            b"tr" => self.container().html.push_str("</tr>"),
            b"tbl" => self.container().html.push_str("</table>"),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if !self.in_text {
            return;
        }
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(&escape_html(text));
        }
    }

    fn finish(mut self) -> String {
        while self.containers.len() > 1 {
            self.close(b"tc");
        }
        let mut root = self.containers.pop().unwrap_or_default();
        root.close_list();
        root.html
    }
}

fn document_to_html<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    let document = read_zip_text(archive, "word/document.xml")?.ok_or_else(|| {
        EditorError::Zip(zip::result::ZipError::FileNotFound)
    })?;
    let rels = match read_zip_text(archive, "word/_rels/document.xml.rels")? {
        Some(xml) => parse_relationships(&xml)?,
        None => HashMap::new(),
    };

    let mut reader = Reader::from_str(&document);
    let mut builder = HtmlBuilder::new(archive, rels);
    loop {
        match reader.read_event()? {
            Event::Start(e) => builder.open(&e),
            Event::Empty(e) => {
                builder.open(&e);
                builder.close(e.local_name().as_ref());
            }
            Event::End(e) => builder.close(e.local_name().as_ref()),
            Event::Text(t) => builder.text(&t.unescape()?),
            Event::CData(t) => builder.text(&String::from_utf8_lossy(&t)),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(builder.finish())
}

/// Converts a `.docx` package to an HTML fragment.
pub fn docx_to_html(docx: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(docx))?;
    let html = document_to_html(&mut archive)?;
    debug!("docx import produced {} bytes of html", html.len());
    Ok(html)
}

/// The built-in [`DocxToHtml`] converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxReader;

impl DocxToHtml for DocxReader {
    fn to_html(&self, docx: &[u8]) -> Result<String> {
        docx_to_html(docx)
    }
}
