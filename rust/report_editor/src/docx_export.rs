//! HTML → DOCX.
//!
//! The HTML is parsed with html5ever and flattened into blocks (paragraphs and
//! tables) of styled text segments, which are then written as a minimal
//! WordprocessingML package. Direction (`dir="rtl"`) is inherited through the
//! DOM and lands on paragraphs (`w:bidi`), runs (`w:rtl`) and tables
//! (`w:bidiVisual`). Data-URL images are stored under `word/media`.

use crate::convert::HtmlToDocx;
use crate::error::{EditorError, Result};
use crate::escape::xml_escape_text;
use crate::image::DataUrl;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use log::debug;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const EMU_PER_PX: u64 = 9525;
// Page content width at 96 dpi (8.5in page, 1in margins).
const MAX_IMAGE_WIDTH_PX: u32 = 624;
const DEFAULT_IMAGE_SIZE_PX: (u32, u32) = (480, 360);
const MAX_ATTR_PX: u32 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct RunStyle {
    bold: bool,
    italic: bool,
    underline: bool,
    strike: bool,
    code: bool,
    rtl: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Picture {
    data: DataUrl,
    width_px: u32,
    height_px: u32,
}

#[derive(Debug, Clone)]
enum Segment {
    Text { text: String, style: RunStyle },
    LinkText { text: String, style: RunStyle, href: String },
    Break,
    Picture(Picture),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParagraphStyle {
    Normal,
    Heading(u8),
    CodeBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ListInfo {
    num_id: u32, // 1 = bullet, 2 = decimal
    ilvl: u32,
}

#[derive(Debug, Clone)]
struct Paragraph {
    style: ParagraphStyle,
    list: Option<ListInfo>,
    rtl: bool,
    align: Option<Align>,
    // Opened by a block element rather than by loose inline content.
    opened: bool,
    segments: Vec<Segment>,
}

impl Paragraph {
    fn empty() -> Self {
        Self {
            style: ParagraphStyle::Normal,
            list: None,
            rtl: false,
            align: None,
            opened: false,
            segments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct TableCell {
    paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone)]
struct TableRow {
    cells: Vec<TableCell>,
}

#[derive(Debug, Clone)]
struct Table {
    rtl: bool,
    rows: Vec<TableRow>,
}

#[derive(Debug, Clone)]
enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

fn sanitize_href(href: &str) -> Option<String> {
    let h = href.trim();
    if h.is_empty() {
        return None;
    }
    let low = h.to_ascii_lowercase();
    if low.starts_with("javascript:") || low.starts_with("data:") || low.starts_with("vbscript:") {
        return None;
    }
    Some(h.to_string())
}

fn html5_parse(input: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(input)
}

fn tag_lower(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string().to_ascii_lowercase()),
        _ => None,
    }
}

fn is_drop_content_tag(lower: &str) -> bool {
    matches!(
        lower,
        "script" | "style" | "noscript" | "template" | "iframe" | "object" | "embed" | "head"
    )
}

fn attrs_vec(node: &Handle) -> Vec<(String, String)> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .map(|a| (a.name.local.to_string(), a.value.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

fn attr_get(attrs: &[(String, String)], name: &str) -> Option<String> {
    for (k, v) in attrs {
        if k.eq_ignore_ascii_case(name) {
            return Some(v.to_string());
        }
    }
    None
}

fn attr_dir(attrs: &[(String, String)]) -> Option<bool> {
    attr_get(attrs, "dir").map(|d| d.trim().eq_ignore_ascii_case("rtl"))
}

fn attr_align(attrs: &[(String, String)]) -> Option<Align> {
    let from_style = attr_get(attrs, "style").and_then(|style| {
        style.split(';').find_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            if prop.trim().eq_ignore_ascii_case("text-align") {
                Some(value.trim().to_ascii_lowercase())
            } else {
                None
            }
        })
    });
    let value = from_style.or_else(|| attr_get(attrs, "align").map(|a| a.to_ascii_lowercase()))?;
    match value.as_str() {
        "left" => Some(Align::Left),
        "right" => Some(Align::Right),
        "center" => Some(Align::Center),
        "justify" => Some(Align::Justify),
        _ => None,
    }
}

fn attr_px(attrs: &[(String, String)], name: &str) -> Option<u32> {
    let raw = attr_get(attrs, name)?;
    let digits: String = raw.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    // Overlong digit runs fail to parse as u64 and are treated as absent.
    let v: u64 = digits.parse().ok().filter(|&v| v > 0)?;
    Some(v.min(MAX_ATTR_PX as u64) as u32)
}

fn scale(value: u32, num: u32, den: u32) -> u32 {
    let scaled = value as u64 * num as u64 / (den as u64).max(1);
    scaled.clamp(1, MAX_ATTR_PX as u64) as u32
}

fn picture_size(attrs: &[(String, String)], data: &DataUrl) -> (u32, u32) {
    let intrinsic = data.png_size().filter(|&(w, h)| w > 0 && h > 0);
    let (w, h) = match (attr_px(attrs, "width"), attr_px(attrs, "height")) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => match intrinsic {
            Some((iw, ih)) => (w, scale(w, ih, iw)),
            None => (w, scale(w, 3, 4)),
        },
        (None, Some(h)) => match intrinsic {
            Some((iw, ih)) => (scale(h, iw, ih), h),
            None => (scale(h, 4, 3), h),
        },
        (None, None) => intrinsic.unwrap_or(DEFAULT_IMAGE_SIZE_PX),
    };
    let (w, h) = (w.max(1), h.max(1));
    if w > MAX_IMAGE_WIDTH_PX {
        (MAX_IMAGE_WIDTH_PX, scale(h, MAX_IMAGE_WIDTH_PX, w))
    } else {
        (w, h)
    }
}

fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_ws {
                out.push(' ');
                in_ws = true;
            }
        } else {
            out.push(ch);
            in_ws = false;
        }
    }
    out
}

#[derive(Clone, Default)]
struct BuildCtx {
    bold_depth: u32,
    italic_depth: u32,
    underline_depth: u32,
    strike_depth: u32,
    code_depth: u32,
    pre_depth: u32,
    link_stack: Vec<Option<String>>,
    list_stack: Vec<u32>, // 1 bullet, 2 decimal
    li_list_stack: Vec<Option<ListInfo>>,
    dir_stack: Vec<Option<bool>>,
    align_stack: Vec<Option<Align>>,
}

impl BuildCtx {
    fn current_href(&self) -> Option<&String> {
        self.link_stack.last().and_then(|x| x.as_ref())
    }

    fn current_list(&self) -> Option<ListInfo> {
        self.li_list_stack.last().cloned().unwrap_or(None)
    }

    fn is_rtl(&self) -> bool {
        self.dir_stack.iter().rev().find_map(|d| *d).unwrap_or(false)
    }

    fn align(&self) -> Option<Align> {
        self.align_stack.iter().rev().find_map(|a| *a)
    }

    fn run_style(&self) -> RunStyle {
        RunStyle {
            bold: self.bold_depth > 0,
            italic: self.italic_depth > 0,
            underline: self.underline_depth > 0,
            strike: self.strike_depth > 0,
            code: (self.code_depth > 0) || (self.pre_depth > 0),
            rtl: self.is_rtl(),
        }
    }
}

fn paragraph_has_content(p: &Paragraph) -> bool {
    p.segments.iter().any(|s| match s {
        Segment::Text { text, .. } => !text.trim().is_empty(),
        Segment::LinkText { text, .. } => !text.trim().is_empty(),
        Segment::Break => true,
        Segment::Picture(_) => true,
    })
}

fn flush_paragraph(blocks: &mut Vec<Block>, current: &mut Paragraph) {
    if paragraph_has_content(current) {
        blocks.push(Block::Paragraph(current.clone()));
    }
    *current = Paragraph::empty();
}

fn start_paragraph(
    blocks: &mut Vec<Block>,
    current: &mut Paragraph,
    style: ParagraphStyle,
    ctx: &BuildCtx,
) {
    flush_paragraph(blocks, current);
    current.style = style;
    current.list = ctx.current_list();
    current.rtl = ctx.is_rtl();
    current.align = ctx.align();
    current.opened = true;
}

// Content outside any block element opens an implicit paragraph that takes the
// surrounding direction.
fn touch_paragraph(current: &mut Paragraph, ctx: &BuildCtx) {
    if !current.opened && current.segments.is_empty() {
        current.rtl = ctx.is_rtl();
        current.align = ctx.align();
    }
}

fn emit_text(current: &mut Paragraph, ctx: &BuildCtx, raw: &str) {
    if raw.is_empty() {
        return;
    }

    let preserve_space = ctx.pre_depth > 0;
    let mut text = if preserve_space {
        raw.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        collapse_ws(&raw.replace("\r\n", "\n").replace('\r', "\n").replace('\n', " "))
    };

    if !preserve_space && current.segments.is_empty() {
        text = text.trim_start().to_string();
    }
    if text.is_empty() {
        return;
    }
    touch_paragraph(current, ctx);

    let style = ctx.run_style();
    let push_text = |s: String, current: &mut Paragraph| {
        if let Some(href) = ctx.current_href() {
            current.segments.push(Segment::LinkText {
                text: s,
                style,
                href: href.to_string(),
            });
        } else {
            current.segments.push(Segment::Text { text: s, style });
        }
    };

    if preserve_space && text.contains('\n') {
        let mut first = true;
        for line in text.split('\n') {
            if !first {
                current.segments.push(Segment::Break);
            }
            first = false;
            if !line.is_empty() {
                push_text(line.to_string(), current);
            }
        }
        return;
    }

    push_text(text, current);
}

fn emit_picture(current: &mut Paragraph, ctx: &BuildCtx, attrs: &[(String, String)]) {
    let Some(src) = attr_get(attrs, "src") else {
        return;
    };
    match DataUrl::parse(&src) {
        Ok(data) => {
            let (width_px, height_px) = picture_size(attrs, &data);
            touch_paragraph(current, ctx);
            current.segments.push(Segment::Picture(Picture {
                data,
                width_px,
                height_px,
            }));
        }
        Err(e) => debug!("skipping image that is not an inline data URL: {e}"),
    }
}

fn parse_table(node: &Handle, ctx: &BuildCtx) -> Table {
    fn find_children(node: &Handle, name: &str, out: &mut Vec<Handle>) {
        if let Some(tag) = tag_lower(node) {
            if tag == name {
                out.push(node.clone());
            }
        }
        for c in node.children.borrow().iter() {
            find_children(c, name, out);
        }
    }

    let mut trs: Vec<Handle> = Vec::new();
    find_children(node, "tr", &mut trs);

    let mut rows: Vec<TableRow> = Vec::new();
    for tr in trs {
        let mut cells: Vec<TableCell> = Vec::new();
        for c in tr.children.borrow().iter() {
            let Some(tag) = tag_lower(c) else { continue };
            if tag != "td" && tag != "th" {
                continue;
            }
            let attrs = attrs_vec(c);
            let mut cell_ctx = ctx.clone();
            cell_ctx.dir_stack.push(attr_dir(&attrs));
            cell_ctx.align_stack.push(attr_align(&attrs));
            if tag == "th" {
                cell_ctx.bold_depth += 1;
            }
            let cell_rtl = cell_ctx.is_rtl();
            let cell_blocks = build_blocks_from_nodes(&c.children.borrow().clone(), false, cell_ctx);
            let mut paras: Vec<Paragraph> = cell_blocks
                .into_iter()
                .filter_map(|b| match b {
                    Block::Paragraph(p) => Some(p),
                    Block::Table(_) => None,
                })
                .collect();
            if paras.is_empty() {
                let mut empty = Paragraph::empty();
                empty.rtl = cell_rtl;
                paras.push(empty);
            }
            cells.push(TableCell { paragraphs: paras });
        }
        if !cells.is_empty() {
            rows.push(TableRow { cells });
        }
    }

    Table {
        rtl: ctx.is_rtl(),
        rows,
    }
}

fn build_blocks_from_nodes(nodes: &[Handle], allow_tables: bool, mut ctx: BuildCtx) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut current = Paragraph::empty();

    fn open_element(
        tag: &str,
        attrs: &[(String, String)],
        ctx: &mut BuildCtx,
        blocks: &mut Vec<Block>,
        current: &mut Paragraph,
    ) {
        match tag {
            "h1" => start_paragraph(blocks, current, ParagraphStyle::Heading(1), ctx),
            "h2" => start_paragraph(blocks, current, ParagraphStyle::Heading(2), ctx),
            "h3" | "h4" | "h5" | "h6" => {
                start_paragraph(blocks, current, ParagraphStyle::Heading(3), ctx)
            }
            "pre" => {
                ctx.pre_depth += 1;
                start_paragraph(blocks, current, ParagraphStyle::CodeBlock, ctx);
            }
            "p" | "div" | "blockquote" => {
                start_paragraph(blocks, current, ParagraphStyle::Normal, ctx)
            }
            "br" => {
                touch_paragraph(current, ctx);
                current.segments.push(Segment::Break);
            }
            "hr" => flush_paragraph(blocks, current),
            "img" => emit_picture(current, ctx, attrs),
            "ul" => ctx.list_stack.push(1),
            "ol" => ctx.list_stack.push(2),
            "li" => {
                let num_id = ctx.list_stack.last().cloned().unwrap_or(1);
                let ilvl = ctx.list_stack.len().saturating_sub(1) as u32;
                ctx.li_list_stack.push(Some(ListInfo { num_id, ilvl }));
                start_paragraph(blocks, current, ParagraphStyle::Normal, ctx);
            }
            "a" => {
                let href = attr_get(attrs, "href").and_then(|h| sanitize_href(&h));
                ctx.link_stack.push(href);
            }
            "code" => ctx.code_depth += 1,
            "b" | "strong" => ctx.bold_depth += 1,
            "i" | "em" => ctx.italic_depth += 1,
            "u" | "ins" => ctx.underline_depth += 1,
            "s" | "strike" | "del" => ctx.strike_depth += 1,
            _ => {}
        }
    }

    fn close_element(tag: &str, ctx: &mut BuildCtx, blocks: &mut Vec<Block>, current: &mut Paragraph) {
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => flush_paragraph(blocks, current),
            "p" | "div" | "blockquote" => flush_paragraph(blocks, current),
            "pre" => {
                flush_paragraph(blocks, current);
                ctx.pre_depth = ctx.pre_depth.saturating_sub(1);
            }
            "ul" | "ol" => {
                let _ = ctx.list_stack.pop();
            }
            "li" => {
                flush_paragraph(blocks, current);
                let _ = ctx.li_list_stack.pop();
            }
            "a" => {
                let _ = ctx.link_stack.pop();
            }
            "code" => ctx.code_depth = ctx.code_depth.saturating_sub(1),
            "b" | "strong" => ctx.bold_depth = ctx.bold_depth.saturating_sub(1),
            "i" | "em" => ctx.italic_depth = ctx.italic_depth.saturating_sub(1),
            "u" | "ins" => ctx.underline_depth = ctx.underline_depth.saturating_sub(1),
            "s" | "strike" | "del" => ctx.strike_depth = ctx.strike_depth.saturating_sub(1),
            _ => {}
        }
    }

    fn walk(
        node: &Handle,
        allow_tables: bool,
        ctx: &mut BuildCtx,
        blocks: &mut Vec<Block>,
        current: &mut Paragraph,
    ) {
        match &node.data {
            NodeData::Text { contents } => {
                let s = contents.borrow().to_string();
                emit_text(current, ctx, &s);
            }
            NodeData::Element { .. } => {
                let Some(tag) = tag_lower(node) else { return };
                if is_drop_content_tag(&tag) {
                    return;
                }
                let attrs = attrs_vec(node);
                ctx.dir_stack.push(attr_dir(&attrs));
                ctx.align_stack.push(attr_align(&attrs));

                if allow_tables && tag == "table" {
                    flush_paragraph(blocks, current);
                    blocks.push(Block::Table(parse_table(node, ctx)));
                } else {
                    open_element(&tag, &attrs, ctx, blocks, current);
                    for c in node.children.borrow().iter() {
                        walk(c, allow_tables, ctx, blocks, current);
                    }
                    close_element(&tag, ctx, blocks, current);
                }

                ctx.dir_stack.pop();
                ctx.align_stack.pop();
            }
            NodeData::Document => {
                for c in node.children.borrow().iter() {
                    walk(c, allow_tables, ctx, blocks, current);
                }
            }
            _ => {}
        }
    }

    for n in nodes {
        walk(n, allow_tables, &mut ctx, &mut blocks, &mut current);
    }
    flush_paragraph(&mut blocks, &mut current);
    blocks
}

fn build_blocks_from_html(input_html: &str) -> Vec<Block> {
    let wrapped = if input_html.to_ascii_lowercase().contains("<html") {
        input_html.to_string()
    } else {
        format!(
            "<!doctype html><html><head><meta charset=\"utf-8\"></head><body>{}</body></html>",
            input_html
        )
    };

    let dom = html5_parse(&wrapped);
    let mut body_children: Vec<Handle> = Vec::new();
    let mut body_ctx = BuildCtx::default();
    fn walk_find_body(node: &Handle, out: &mut Vec<Handle>, ctx: &mut BuildCtx) -> bool {
        if let NodeData::Element { name, .. } = &node.data {
            let attrs = attrs_vec(node);
            let tag = name.local.to_string();
            if tag.eq_ignore_ascii_case("html") || tag.eq_ignore_ascii_case("body") {
                ctx.dir_stack.push(attr_dir(&attrs));
                ctx.align_stack.push(attr_align(&attrs));
            }
            if tag.eq_ignore_ascii_case("body") {
                out.extend(node.children.borrow().iter().cloned());
                return true;
            }
        }
        for c in node.children.borrow().iter() {
            if walk_find_body(c, out, ctx) {
                return true;
            }
        }
        false
    }
    if !walk_find_body(&dom.document, &mut body_children, &mut body_ctx) {
        body_children = dom.document.children.borrow().iter().cloned().collect();
    }
    build_blocks_from_nodes(&body_children, true, body_ctx)
}

/// Relationship ids and media names handed out while the document is written.
struct PartIds<'a> {
    link_to_rid: &'a BTreeMap<String, String>,
    pictures: &'a [PicturePart],
    next_picture: usize,
}

struct PicturePart {
    rid: String,
    media_name: String,
    bytes: Vec<u8>,
    extension: &'static str,
}

fn run_xml(text: &str, style: RunStyle, link: bool) -> String {
    if text.is_empty() {
        return String::new();
    }
    let escaped = xml_escape_text(text);
    let mut out = String::new();
    out.push_str("<w:r>");
    let has_props = style.bold || style.italic || style.underline || style.strike || style.code || style.rtl;
    if has_props || link {
        out.push_str("<w:rPr>");
        if style.code {
            out.push_str("<w:rFonts w:ascii=\"Consolas\" w:hAnsi=\"Consolas\" w:cs=\"Consolas\"/>");
        }
        if style.bold {
            out.push_str("<w:b/><w:bCs/>");
        }
        if style.italic {
            out.push_str("<w:i/><w:iCs/>");
        }
        if style.strike {
            out.push_str("<w:strike/>");
        }
        if link {
            out.push_str("<w:color w:val=\"1155CC\"/>");
        }
        if style.underline || link {
            out.push_str("<w:u w:val=\"single\"/>");
        }
        if style.rtl {
            out.push_str("<w:rtl/>");
        }
        out.push_str("</w:rPr>");
    }
    out.push_str("<w:t xml:space=\"preserve\">");
    out.push_str(&escaped);
    out.push_str("</w:t></w:r>");
    out
}

fn picture_xml(part: &PicturePart, doc_pr_id: usize, p: &Picture) -> String {
    let cx = p.width_px as u64 * EMU_PER_PX;
    let cy = p.height_px as u64 * EMU_PER_PX;
    format!(
        r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="Picture {id}"/><a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
        cx = cx,
        cy = cy,
        id = doc_pr_id,
        name = part.media_name,
        rid = part.rid,
    )
}

fn paragraph_xml(p: &Paragraph, ids: &mut PartIds) -> String {
    let mut out = String::new();
    out.push_str("<w:p>");

    let jc = match p.align {
        Some(Align::Center) => Some("center"),
        Some(Align::Justify) => Some("both"),
        Some(Align::Right) if !p.rtl => Some("right"),
        _ => None,
    };
    if p.style != ParagraphStyle::Normal || p.list.is_some() || p.rtl || jc.is_some() {
        out.push_str("<w:pPr>");
        match p.style {
            ParagraphStyle::Normal => {}
            ParagraphStyle::Heading(level) => {
                out.push_str(&format!("<w:pStyle w:val=\"Heading{}\"/>", level.clamp(1, 3)))
            }
            ParagraphStyle::CodeBlock => out.push_str("<w:pStyle w:val=\"CodeBlock\"/>"),
        }
        if let Some(li) = p.list {
            out.push_str("<w:numPr>");
            out.push_str(&format!("<w:ilvl w:val=\"{}\"/>", li.ilvl));
            out.push_str(&format!("<w:numId w:val=\"{}\"/>", li.num_id));
            out.push_str("</w:numPr>");
        }
        if p.rtl {
            out.push_str("<w:bidi/>");
        }
        if let Some(jc) = jc {
            out.push_str(&format!("<w:jc w:val=\"{jc}\"/>"));
        }
        out.push_str("</w:pPr>");
    }

    let link_to_rid = ids.link_to_rid;
    let mut in_link: Option<(String, RunStyle, String)> = None;
    let flush_link = |out: &mut String, st: &mut Option<(String, RunStyle, String)>| {
        if let Some((buf, style, href)) = st.take() {
            if buf.is_empty() {
                return;
            }
            if let Some(rid) = link_to_rid.get(&href) {
                out.push_str(&format!("<w:hyperlink r:id=\"{}\" w:history=\"1\">", rid));
                out.push_str(&run_xml(&buf, style, true));
                out.push_str("</w:hyperlink>");
            } else {
                out.push_str(&run_xml(&buf, style, false));
            }
        }
    };

    for seg in &p.segments {
        match seg {
            Segment::Break => {
                flush_link(&mut out, &mut in_link);
                out.push_str("<w:r><w:br/></w:r>");
            }
            Segment::Picture(picture) => {
                flush_link(&mut out, &mut in_link);
                let index = ids.next_picture;
                ids.next_picture += 1;
                if let Some(part) = ids.pictures.get(index) {
                    out.push_str(&picture_xml(part, index + 1, picture));
                }
            }
            Segment::Text { text, style } => {
                flush_link(&mut out, &mut in_link);
                out.push_str(&run_xml(text, *style, false));
            }
            Segment::LinkText { text, style, href } => match &mut in_link {
                Some((buf, cur_style, cur_href)) if cur_href == href && *cur_style == *style => {
                    buf.push_str(text);
                }
                _ => {
                    flush_link(&mut out, &mut in_link);
                    in_link = Some((text.clone(), *style, href.clone()));
                }
            },
        }
    }
    flush_link(&mut out, &mut in_link);

    out.push_str("</w:p>");
    out
}

fn table_xml(t: &Table, ids: &mut PartIds) -> String {
    let mut out = String::new();
    out.push_str("<w:tbl>");
    out.push_str("<w:tblPr>");
    if t.rtl {
        out.push_str("<w:bidiVisual/>");
    }
    out.push_str("<w:tblW w:w=\"0\" w:type=\"auto\"/>");
    out.push_str(
        r#"<w:tblBorders>
<w:top w:val="single" w:sz="4" w:space="0" w:color="D9D9D9"/>
<w:left w:val="single" w:sz="4" w:space="0" w:color="D9D9D9"/>
<w:bottom w:val="single" w:sz="4" w:space="0" w:color="D9D9D9"/>
<w:right w:val="single" w:sz="4" w:space="0" w:color="D9D9D9"/>
<w:insideH w:val="single" w:sz="4" w:space="0" w:color="D9D9D9"/>
<w:insideV w:val="single" w:sz="4" w:space="0" w:color="D9D9D9"/>
</w:tblBorders>"#,
    );
    out.push_str("</w:tblPr>");

    for row in &t.rows {
        out.push_str("<w:tr>");
        for cell in &row.cells {
            out.push_str("<w:tc>");
            out.push_str("<w:tcPr><w:tcW w:w=\"0\" w:type=\"auto\"/></w:tcPr>");
            for p in &cell.paragraphs {
                out.push_str(&paragraph_xml(p, ids));
            }
            out.push_str("</w:tc>");
        }
        out.push_str("</w:tr>");
    }

    out.push_str("</w:tbl>");
    out
}

fn document_xml(blocks: &[Block], ids: &mut PartIds) -> String {
    let mut body = String::new();
    for b in blocks {
        match b {
            Block::Paragraph(p) => body.push_str(&paragraph_xml(p, ids)),
            Block::Table(t) => body.push_str(&table_xml(t, ids)),
        }
    }
    if blocks.is_empty() {
        body.push_str("<w:p/>");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:wpc="http://schemas.microsoft.com/office/word/2010/wordprocessingCanvas"
 xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"
 xmlns:o="urn:schemas-microsoft-com:office:office"
 xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
 xmlns:v="urn:schemas-microsoft-com:vml"
 xmlns:wp14="http://schemas.microsoft.com/office/word/2010/wordprocessingDrawing"
 xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"
 xmlns:w10="urn:schemas-microsoft-com:office:word"
 xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
 xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordprocessingml"
 xmlns:w15="http://schemas.microsoft.com/office/word/2012/wordprocessingml"
 xmlns:wpg="http://schemas.microsoft.com/office/word/2010/wordprocessingGroup"
 xmlns:wpi="http://schemas.microsoft.com/office/word/2010/wordprocessingInk"
 xmlns:wne="http://schemas.microsoft.com/office/word/2006/wordml"
 xmlns:wps="http://schemas.microsoft.com/office/word/2010/wordprocessingShape"
 mc:Ignorable="w14 w15 wp14">
  <w:body>
    {body}
    <w:sectPr>
      <w:pgSz w:w="12240" w:h="15840"/>
      <w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/>
      <w:cols w:space="708"/>
      <w:docGrid w:linePitch="360"/>
    </w:sectPr>
  </w:body>
</w:document>"#,
        body = body
    )
}

fn media_content_type(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn content_types_xml(has_numbering: bool, media_extensions: &BTreeSet<&str>) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    out.push('\n');
    out.push_str(
        r#"  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    out.push('\n');
    out.push_str(r#"  <Default Extension="xml" ContentType="application/xml"/>"#);
    out.push('\n');
    for ext in media_extensions {
        out.push_str(&format!(
            r#"  <Default Extension="{ext}" ContentType="{}"/>"#,
            media_content_type(ext)
        ));
        out.push('\n');
    }
    out.push_str(r#"  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#);
    out.push('\n');
    out.push_str(r#"  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
    out.push('\n');
    if has_numbering {
        out.push_str(r#"  <Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>"#);
        out.push('\n');
    }
    out.push_str("</Types>");
    out
}

fn rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#
}

fn document_rels_xml(
    link_to_rid: &BTreeMap<String, String>,
    pictures: &[PicturePart],
    has_numbering: bool,
) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    out.push('\n');
    out.push_str(r#"  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#);
    out.push('\n');
    if has_numbering {
        out.push_str(r#"  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>"#);
        out.push('\n');
    }
    for (href, rid) in link_to_rid {
        out.push_str(&format!(
            r#"  <Relationship Id="{rid}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="{href}" TargetMode="External"/>"#,
            rid = rid,
            href = xml_escape_text(href),
        ));
        out.push('\n');
    }
    for part in pictures {
        out.push_str(&format!(
            r#"  <Relationship Id="{rid}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/{name}"/>"#,
            rid = part.rid,
            name = part.media_name,
        ));
        out.push('\n');
    }
    out.push_str("</Relationships>");
    out
}

fn styles_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:uiPriority w:val="9"/>
    <w:qFormat/>
    <w:pPr>
      <w:keepNext/>
      <w:spacing w:before="360" w:after="120"/>
      <w:outlineLvl w:val="0"/>
    </w:pPr>
    <w:rPr>
      <w:b/>
      <w:bCs/>
      <w:sz w:val="32"/>
      <w:szCs w:val="32"/>
    </w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading2">
    <w:name w:val="heading 2"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:uiPriority w:val="9"/>
    <w:qFormat/>
    <w:pPr>
      <w:keepNext/>
      <w:spacing w:before="240" w:after="120"/>
      <w:outlineLvl w:val="1"/>
    </w:pPr>
    <w:rPr>
      <w:b/>
      <w:bCs/>
      <w:sz w:val="28"/>
      <w:szCs w:val="28"/>
    </w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading3">
    <w:name w:val="heading 3"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:uiPriority w:val="9"/>
    <w:qFormat/>
    <w:pPr>
      <w:keepNext/>
      <w:spacing w:before="200" w:after="80"/>
      <w:outlineLvl w:val="2"/>
    </w:pPr>
    <w:rPr>
      <w:b/>
      <w:bCs/>
      <w:sz w:val="24"/>
      <w:szCs w:val="24"/>
    </w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="CodeBlock">
    <w:name w:val="Code Block"/>
    <w:basedOn w:val="Normal"/>
    <w:uiPriority w:val="99"/>
    <w:qFormat/>
    <w:pPr>
      <w:spacing w:before="120" w:after="120"/>
    </w:pPr>
    <w:rPr>
      <w:rFonts w:ascii="Consolas" w:hAnsi="Consolas" w:cs="Consolas"/>
      <w:sz w:val="20"/>
    </w:rPr>
  </w:style>
</w:styles>"#
}

fn numbering_xml() -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(r#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#);
    out.push('\n');
    for (abstract_id, fmt) in [(1, "bullet"), (2, "decimal")] {
        out.push_str(&format!("  <w:abstractNum w:abstractNumId=\"{abstract_id}\">"));
        out.push_str("<w:multiLevelType w:val=\"hybridMultilevel\"/>");
        for ilvl in 0..9 {
            let text = if fmt == "bullet" {
                "•".to_string()
            } else {
                format!("%{}.", ilvl + 1)
            };
            let indent = 720 * (ilvl + 1);
            out.push_str(&format!(
                "<w:lvl w:ilvl=\"{ilvl}\"><w:start w:val=\"1\"/><w:numFmt w:val=\"{fmt}\"/><w:lvlText w:val=\"{text}\"/><w:lvlJc w:val=\"left\"/><w:pPr><w:ind w:left=\"{indent}\" w:hanging=\"360\"/></w:pPr></w:lvl>"
            ));
        }
        out.push_str("</w:abstractNum>\n");
    }
    out.push_str("  <w:num w:numId=\"1\"><w:abstractNumId w:val=\"1\"/></w:num>\n");
    out.push_str("  <w:num w:numId=\"2\"><w:abstractNumId w:val=\"2\"/></w:num>\n");
    out.push_str("</w:numbering>");
    out
}

fn for_each_paragraph(blocks: &[Block], f: &mut dyn FnMut(&Paragraph)) {
    for b in blocks {
        match b {
            Block::Paragraph(p) => f(p),
            Block::Table(t) => {
                for row in &t.rows {
                    for cell in &row.cells {
                        for p in &cell.paragraphs {
                            f(p);
                        }
                    }
                }
            }
        }
    }
}

fn gather_hrefs(blocks: &[Block]) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for_each_paragraph(blocks, &mut |p| {
        for s in &p.segments {
            if let Segment::LinkText { href, .. } = s {
                out.insert(href.to_string());
            }
        }
    });
    out
}

fn gather_pictures(blocks: &[Block], first_rid: u32) -> Vec<PicturePart> {
    let mut out: Vec<PicturePart> = Vec::new();
    for_each_paragraph(blocks, &mut |p| {
        for s in &p.segments {
            if let Segment::Picture(picture) = s {
                let n = out.len() + 1;
                let extension = picture.data.extension();
                out.push(PicturePart {
                    rid: format!("rId{}", first_rid + n as u32 - 1),
                    media_name: format!("image{n}.{extension}"),
                    bytes: picture.data.bytes.clone(),
                    extension,
                });
            }
        }
    });
    out
}

fn blocks_need_numbering(blocks: &[Block]) -> bool {
    let mut found = false;
    for_each_paragraph(blocks, &mut |p| found |= p.list.is_some());
    found
}

fn write_package(
    document_xml: &str,
    doc_rels_xml: &str,
    pictures: &[PicturePart],
    has_numbering: bool,
) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default();

    let media_extensions: BTreeSet<&str> = pictures.iter().map(|p| p.extension).collect();
    zip.start_file("[Content_Types].xml", opts)?;
    zip.write_all(content_types_xml(has_numbering, &media_extensions).as_bytes())?;

    zip.start_file("_rels/.rels", opts)?;
    zip.write_all(rels_xml().as_bytes())?;

    zip.start_file("word/document.xml", opts)?;
    zip.write_all(document_xml.as_bytes())?;

    zip.start_file("word/styles.xml", opts)?;
    zip.write_all(styles_xml().as_bytes())?;

    if has_numbering {
        zip.start_file("word/numbering.xml", opts)?;
        zip.write_all(numbering_xml().as_bytes())?;
    }

    for part in pictures {
        zip.start_file(format!("word/media/{}", part.media_name), opts)?;
        zip.write_all(&part.bytes)?;
    }

    zip.start_file("word/_rels/document.xml.rels", opts)?;
    zip.write_all(doc_rels_xml.as_bytes())?;

    Ok(zip.finish()?.into_inner())
}

/// Converts HTML to a `.docx` package.
pub fn html_to_docx(html: &str) -> Result<Vec<u8>> {
    if html.trim().is_empty() {
        return Err(EditorError::EmptyDocument);
    }

    let blocks = build_blocks_from_html(html);

    let hrefs = gather_hrefs(&blocks);
    let mut link_to_rid = BTreeMap::new();
    let mut rid_counter: u32 = 10;
    for href in hrefs {
        link_to_rid.insert(href, format!("rId{}", rid_counter));
        rid_counter += 1;
    }
    let pictures = gather_pictures(&blocks, rid_counter);
    let has_numbering = blocks_need_numbering(&blocks);

    let mut ids = PartIds {
        link_to_rid: &link_to_rid,
        pictures: &pictures,
        next_picture: 0,
    };
    let doc_xml = document_xml(&blocks, &mut ids);
    let doc_rels = document_rels_xml(&link_to_rid, &pictures, has_numbering);

    debug!(
        "docx: {} blocks, {} links, {} pictures",
        blocks.len(),
        link_to_rid.len(),
        pictures.len()
    );
    write_package(&doc_xml, &doc_rels, &pictures, has_numbering)
}

/// The built-in [`HtmlToDocx`] converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxWriter;

impl HtmlToDocx for DocxWriter {
    fn to_docx(&self, html: &str) -> Result<Vec<u8>> {
        html_to_docx(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_part(docx: &[u8], name: &str) -> Option<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut file = archive.by_name(name).ok()?;
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        Some(out)
    }

    fn paragraphs(html: &str) -> Vec<Paragraph> {
        let mut out = Vec::new();
        for_each_paragraph(&build_blocks_from_html(html), &mut |p| out.push(p.clone()));
        out
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(html_to_docx("  "), Err(EditorError::EmptyDocument)));
    }

    #[test]
    fn empty_body_still_produces_a_package() {
        let docx = html_to_docx("<html><head></head><body></body></html>").unwrap();
        let doc = read_part(&docx, "word/document.xml").unwrap();
        assert!(doc.contains("<w:p/>"));
    }

    #[test]
    fn headings_and_paragraphs() {
        let docx = html_to_docx("<h1>Title</h1><p>Hello <b>bold</b> &amp; more</p>").unwrap();
        let doc = read_part(&docx, "word/document.xml").unwrap();
        assert!(doc.contains("<w:pStyle w:val=\"Heading1\"/>"));
        assert!(doc.contains(">Title</w:t>"));
        assert!(doc.contains("<w:b/>"));
        assert!(doc.contains("&amp; more"));
        assert!(read_part(&docx, "word/styles.xml").is_some());
        assert!(read_part(&docx, "word/numbering.xml").is_none());
    }

    #[test]
    fn rtl_is_inherited_from_ancestors() {
        let ps = paragraphs("<div dir=\"rtl\"><h2>عنوان</h2><p>متن</p></div><p>ltr</p>");
        assert_eq!(ps.len(), 3);
        assert!(ps[0].rtl && ps[1].rtl);
        assert!(!ps[2].rtl);
        match &ps[1].segments[0] {
            Segment::Text { style, .. } => assert!(style.rtl),
            other => panic!("unexpected segment {other:?}"),
        }
    }

    #[test]
    fn rtl_paragraph_xml() {
        let docx = html_to_docx("<p dir=\"rtl\" style=\"text-align: right;\">سلام</p>").unwrap();
        let doc = read_part(&docx, "word/document.xml").unwrap();
        assert!(doc.contains("<w:bidi/>"));
        assert!(doc.contains("<w:rtl/>"));
        assert!(!doc.contains("<w:jc "));
    }

    #[test]
    fn body_direction_applies_to_content() {
        let ps = paragraphs("<html><body dir=\"rtl\"><p>x</p></body></html>");
        assert!(ps[0].rtl);
    }

    #[test]
    fn tables_keep_cells_and_direction() {
        let html = "<table dir=\"rtl\"><tr><th>row</th><th>c1</th></tr><tr><td>r1</td><td></td></tr></table>";
        let blocks = build_blocks_from_html(html);
        assert_eq!(blocks.len(), 1);
        let Block::Table(t) = &blocks[0] else {
            panic!("expected a table");
        };
        assert!(t.rtl);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[1].cells.len(), 2);
        assert!(t.rows[1].cells[1].paragraphs[0].segments.is_empty());
        match &t.rows[0].cells[0].paragraphs[0].segments[0] {
            Segment::Text { style, .. } => assert!(style.bold),
            other => panic!("unexpected segment {other:?}"),
        }

        let docx = html_to_docx(html).unwrap();
        let doc = read_part(&docx, "word/document.xml").unwrap();
        assert!(doc.contains("<w:bidiVisual/>"));
        assert_eq!(doc.matches("<w:tc>").count(), 4);
    }

    #[test]
    fn spacer_paragraph_survives() {
        let ps = paragraphs("<p><br></p><p>x</p>");
        assert_eq!(ps.len(), 2);
        assert!(matches!(ps[0].segments[0], Segment::Break));
    }

    #[test]
    fn lists_use_numbering_part() {
        let docx = html_to_docx("<ol><li>one</li><li>two</li></ol>").unwrap();
        let doc = read_part(&docx, "word/document.xml").unwrap();
        assert!(doc.contains("<w:numId w:val=\"2\"/>"));
        assert!(read_part(&docx, "word/numbering.xml").is_some());
        let rels = read_part(&docx, "word/_rels/document.xml.rels").unwrap();
        assert!(rels.contains("numbering.xml"));
    }

    #[test]
    fn links_become_hyperlinks() {
        let docx = html_to_docx("<p><a href=\"https://example.com\">site</a></p>").unwrap();
        let doc = read_part(&docx, "word/document.xml").unwrap();
        assert!(doc.contains("<w:hyperlink r:id=\"rId10\""));
        let rels = read_part(&docx, "word/_rels/document.xml.rels").unwrap();
        assert!(rels.contains("Target=\"https://example.com\""));
    }

    #[test]
    fn script_links_are_dropped() {
        let docx = html_to_docx("<p><a href=\"javascript:alert(1)\">x</a><script>bad()</script></p>").unwrap();
        let doc = read_part(&docx, "word/document.xml").unwrap();
        assert!(!doc.contains("w:hyperlink"));
        assert!(!doc.contains("bad()"));
    }

    #[test]
    fn data_url_images_are_embedded() {
        let mut png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR".to_vec();
        png.extend_from_slice(&1000u32.to_be_bytes());
        png.extend_from_slice(&500u32.to_be_bytes());
        let url = crate::image::data_url("image/png", &png);
        let html = format!("<p>before<img src=\"{url}\"></p><p><img src=\"https://x/y.png\"></p>");

        let ps = paragraphs(&html);
        let Segment::Picture(picture) = &ps[0].segments[1] else {
            panic!("expected a picture");
        };
        assert_eq!((picture.width_px, picture.height_px), (MAX_IMAGE_WIDTH_PX, 312));

        let docx = html_to_docx(&html).unwrap();
        let doc = read_part(&docx, "word/document.xml").unwrap();
        assert_eq!(doc.matches("<w:drawing>").count(), 1);
        assert!(doc.contains("r:embed=\"rId10\""));
        let rels = read_part(&docx, "word/_rels/document.xml.rels").unwrap();
        assert!(rels.contains("Target=\"media/image1.png\""));
        let types = read_part(&docx, "[Content_Types].xml").unwrap();
        assert!(types.contains("Extension=\"png\""));

        let mut archive = zip::ZipArchive::new(Cursor::new(&docx[..])).unwrap();
        let mut media = Vec::new();
        archive
            .by_name("word/media/image1.png")
            .unwrap()
            .read_to_end(&mut media)
            .unwrap();
        assert_eq!(media, png);
    }

    #[test]
    fn oversized_image_attributes_are_clamped() {
        let gif = "data:image/gif;base64,R0lGODlh";
        let ps = paragraphs(&format!("<p><img width=\"2000000000\" src=\"{gif}\"></p>"));
        let Segment::Picture(picture) = &ps[0].segments[0] else {
            panic!("expected a picture");
        };
        assert_eq!((picture.width_px, picture.height_px), (MAX_IMAGE_WIDTH_PX, 468));

        let ps = paragraphs(&format!(
            "<p><img height=\"4294967295\" src=\"{gif}\"><img width=\"99999999999999999999999\" src=\"{gif}\"></p>"
        ));
        let Segment::Picture(tall) = &ps[0].segments[0] else {
            panic!("expected a picture");
        };
        assert_eq!(tall.width_px, MAX_IMAGE_WIDTH_PX);
        let Segment::Picture(unparsed) = &ps[0].segments[1] else {
            panic!("expected a picture");
        };
        assert_eq!((unparsed.width_px, unparsed.height_px), DEFAULT_IMAGE_SIZE_PX);

        let docx = html_to_docx(&format!("<p><img width=\"2000000000\" src=\"{gif}\"></p>")).unwrap();
        let doc = read_part(&docx, "word/document.xml").unwrap();
        assert!(doc.contains(&format!("cx=\"{}\"", MAX_IMAGE_WIDTH_PX as u64 * EMU_PER_PX)));
    }

    #[test]
    fn writer_trait_delegates() {
        let docx = DocxWriter.to_docx("<p>x</p>").unwrap();
        assert!(read_part(&docx, "word/document.xml").unwrap().contains(">x</w:t>"));
    }
}
