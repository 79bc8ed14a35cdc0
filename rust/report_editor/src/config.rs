//! Editor settings.
//!
//! Settings are read from an optional JSON file; every field falls back to its
//! default so a partial (or empty) file is valid.

use crate::error::{EditorError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_EXPORT_FILE_NAME: &str = "document.docx";

/// Target locale of generated markup. Only affects synthetic labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Fa,
    Ar,
    En,
}

impl Locale {
    /// Label of the synthetic first column of a rendered table.
    pub fn row_label(self) -> &'static str {
        match self {
            Locale::Fa => "ردیف",
            Locale::Ar => "صف",
            Locale::En => "row",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fa" => Some(Locale::Fa),
            "ar" => Some(Locale::Ar),
            "en" => Some(Locale::En),
            _ => None,
        }
    }
}

/// How imported plain text reaches the document value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlainTextPolicy {
    /// Escape `&`, `<` and `>`; text stays text.
    #[default]
    Escape,
    /// Insert the text as-is, letting the surface interpret it as HTML.
    Verbatim,
}

impl PlainTextPolicy {
    pub fn apply(self, text: &str) -> String {
        match self {
            PlainTextPolicy::Escape => crate::escape::escape_text(text),
            PlainTextPolicy::Verbatim => text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub locale: Locale,
    pub export_file_name: String,
    pub plain_text: PlainTextPolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            plain_text: PlainTextPolicy::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: EditorConfig = serde_json::from_str(text)?;
        if config.export_file_name.trim().is_empty() {
            return Err(EditorError::Config(
                "export_file_name must not be empty".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config from: {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = EditorConfig::from_json("  ").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.export_file_name, "document.docx");
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config = EditorConfig::from_json(r#"{"locale":"en"}"#).unwrap();
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.plain_text, PlainTextPolicy::Escape);
    }

    #[test]
    fn blank_file_name_is_rejected() {
        let err = EditorConfig::from_json(r#"{"export_file_name":" "}"#).unwrap_err();
        assert!(matches!(err, EditorError::Config(_)));
    }

    #[test]
    fn locale_row_labels() {
        assert_eq!(Locale::En.row_label(), "row");
        assert_eq!(Locale::parse("FA"), Some(Locale::Fa));
        assert_eq!(Locale::parse("de"), None);
    }

    #[test]
    fn verbatim_policy_keeps_markup() {
        assert_eq!(PlainTextPolicy::Verbatim.apply("<b>x</b>"), "<b>x</b>");
        assert_eq!(PlainTextPolicy::Escape.apply("<b>x</b>"), "&lt;b&gt;x&lt;/b&gt;");
    }
}
