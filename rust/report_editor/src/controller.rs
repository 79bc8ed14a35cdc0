//! The toolbar: import, image, direction and export actions over one surface.

use crate::config::EditorConfig;
use crate::convert::{DocxToHtml, HtmlToDocx};
use crate::docx_export::DocxWriter;
use crate::docx_import::DocxReader;
use crate::error::Result;
use crate::export::{export_document, ExportedDocument};
use crate::image::read_data_url;
use crate::import::{self, ImportControl};
use crate::surface::{Embed, RichTextSurface, Selection};
use log::{debug, info};
use std::path::Path;

/// Text direction of the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Direction::Ltr => Direction::Rtl,
            Direction::Rtl => Direction::Ltr,
        }
    }
}

/// Generation snapshot taken when an import begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Applied,
    /// The file was not one the picker accepts.
    Ignored,
    /// A newer import started after this one.
    Stale,
}

pub struct Toolbar<S: RichTextSurface> {
    surface: S,
    docx_reader: Box<dyn DocxToHtml>,
    docx_writer: Box<dyn HtmlToDocx>,
    config: EditorConfig,
    generation: u64,
    direction: Direction,
}

impl<S: RichTextSurface> Toolbar<S> {
    pub fn new(surface: S, config: EditorConfig) -> Self {
        Self::with_converters(surface, config, Box::new(DocxReader), Box::new(DocxWriter))
    }

    pub fn with_converters(
        surface: S,
        config: EditorConfig,
        docx_reader: Box<dyn DocxToHtml>,
        docx_writer: Box<dyn HtmlToDocx>,
    ) -> Self {
        Self {
            surface,
            docx_reader,
            docx_writer,
            config,
            generation: 0,
            direction: Direction::default(),
        }
    }

    pub fn value(&self) -> &str {
        self.surface.value()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Replaces the value as the user would by typing. Pending imports go stale.
    pub fn edit(&mut self, html: impl Into<String>) {
        self.generation += 1;
        self.surface.set_value(html.into());
    }

    pub fn begin_import(&mut self) -> ImportTicket {
        self.generation += 1;
        ImportTicket {
            generation: self.generation,
        }
    }

    /// Applies an import result if no newer import or edit happened since
    /// `ticket` was taken.
    pub fn finish_import(&mut self, ticket: ImportTicket, html: String) -> ImportStatus {
        if ticket.generation != self.generation {
            debug!(
                "Dropping stale import (ticket {}, current {})",
                ticket.generation, self.generation
            );
            return ImportStatus::Stale;
        }
        info!("Imported {} bytes of html", html.len());
        self.surface.set_value(html);
        ImportStatus::Applied
    }

    /// Loads `path` as picked from `control`. On error the document is left as is.
    pub fn import_file(&mut self, path: &Path, control: ImportControl) -> Result<ImportStatus> {
        if !control.accepts_path(path) {
            debug!("Ignoring {} for the {:?} picker", path.display(), control);
            return Ok(ImportStatus::Ignored);
        }
        let ticket = self.begin_import();
        match import::load(path, control, &self.config, self.docx_reader.as_ref())? {
            Some(html) => Ok(self.finish_import(ticket, html)),
            None => Ok(ImportStatus::Ignored),
        }
    }

    /// Embeds the image at the cursor (or at the start when there is none)
    /// and moves the cursor past it.
    pub fn insert_image_file(&mut self, path: &Path) -> Result<()> {
        let url = read_data_url(path)?;
        debug!("Inserting image {} ({} bytes as data url)", path.display(), url.len());
        let selection = match self.surface.selection() {
            Some(s) => s,
            None => {
                let s = Selection::default();
                self.surface.set_selection(s);
                s
            }
        };
        self.surface.insert_embed(selection.index, Embed::Image(url));
        self.surface.set_selection(Selection {
            index: selection.index + 1,
            length: 0,
        });
        Ok(())
    }

    pub fn toggle_rtl(&mut self) -> Direction {
        self.direction = self.direction.flipped();
        let root = self.surface.root_mut();
        match self.direction {
            Direction::Rtl => {
                root.dir = Some("rtl".to_string());
                root.text_align = Some("right".to_string());
            }
            Direction::Ltr => {
                root.dir = None;
                root.text_align = None;
            }
        }
        debug!("Direction is now {:?}", self.direction);
        self.direction
    }

    pub fn export(&self) -> Result<ExportedDocument> {
        export_document(
            self.surface.value(),
            self.direction,
            self.docx_writer.as_ref(),
            &self.config.export_file_name,
        )
    }
}
