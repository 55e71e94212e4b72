//! Content languages and localized field resolution.
//!
//! Every localizable attribute is stored three times: a base value plus a
//! `_ru` and an `_en` variant. Resolution for a requested language `L`:
//!
//! 1. the `L` variant, if it has non-whitespace content
//! 2. otherwise the base value, if it has non-whitespace content
//! 3. otherwise the other language's variant, as stored (possibly empty)
//!
//! The language is always a request-scoped value passed in explicitly.

use serde::{Deserialize, Serialize};

/// Supported content languages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
}

impl Language {
    /// Fold a raw language tag to a supported language.
    ///
    /// Accepts header-style values (`en-US,en;q=0.9`): the first tag's
    /// primary subtag decides. Anything unsupported folds to the default.
    pub fn parse(raw: &str) -> Self {
        let primary = raw
            .split(',')
            .next()
            .unwrap_or_default()
            .split('-')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Self::En,
            _ => Self::Ru,
        }
    }

    /// Pick the language for a request: an explicit query value wins over
    /// the header. Empty values count as absent.
    pub fn negotiate(query: Option<&str>, header: Option<&str>) -> Self {
        query
            .filter(|v| !v.is_empty())
            .or_else(|| header.filter(|v| !v.is_empty()))
            .map(Self::parse)
            .unwrap_or_default()
    }

    /// The other supported language.
    pub fn other(self) -> Self {
        match self {
            Self::Ru => Self::En,
            Self::En => Self::Ru,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Ru => "ru",
            Self::En => "en",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Borrowed view of the three stored variants of one localizable field.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalizedText<'a> {
    pub base: &'a str,
    pub ru: &'a str,
    pub en: &'a str,
}

impl<'a> LocalizedText<'a> {
    pub fn new(base: &'a str, ru: &'a str, en: &'a str) -> Self {
        Self { base, ru, en }
    }

    /// A field with no base value (ranks only store per-language text).
    pub fn without_base(ru: &'a str, en: &'a str) -> Self {
        Self { base: "", ru, en }
    }

    fn variant(&self, lang: Language) -> &'a str {
        match lang {
            Language::Ru => self.ru,
            Language::En => self.en,
        }
    }

    /// Resolve the field for `lang` using the three-tier fallback.
    pub fn resolve(&self, lang: Language) -> &'a str {
        let preferred = self.variant(lang);
        if !preferred.trim().is_empty() {
            return preferred;
        }
        if !self.base.trim().is_empty() {
            return self.base;
        }
        self.variant(lang.other())
    }
}

/// Localizable attribute names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextField {
    Title,
    Description,
    Tagline,
    Body,
}

/// Entities with localizable text. Each implementor maps field names to
/// its stored columns explicitly; unsupported fields yield empty text.
pub trait Localized {
    fn text(&self, field: TextField) -> LocalizedText<'_>;

    fn localized(&self, field: TextField, lang: Language) -> String {
        self.text(field).resolve(lang).to_string()
    }

    fn localized_title(&self, lang: Language) -> String {
        self.localized(TextField::Title, lang)
    }

    fn localized_description(&self, lang: Language) -> String {
        self.localized(TextField::Description, lang)
    }
}
