//! Language selection from a user-supplied string

use crate::Language;

/// What the user asked for with `--lang`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageSelector {
    /// Numeric language id
    Id(u32),
    /// Code, culture, country code or name, compared case-insensitively
    Text(String),
}

impl LanguageSelector {
    /// Interpret an all-digit selector as an id, anything else as text
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = raw.parse() {
                return LanguageSelector::Id(id);
            }
        }
        LanguageSelector::Text(raw.to_lowercase())
    }
}

/// First language matching the selector, in listing order
///
/// Text selectors match a language when its country code, culture, language
/// code or language name equals the selector.
pub fn find_language<'a>(languages: &'a [Language], selector: &LanguageSelector) -> Option<&'a Language> {
    match selector {
        LanguageSelector::Id(id) => languages.iter().find(|l| l.language_id == *id),
        LanguageSelector::Text(text) => languages.iter().find(|l| {
            [
                &l.country_code,
                &l.culture,
                &l.language_code,
                &l.language_name,
            ]
            .iter()
            .any(|field| field.to_lowercase() == *text)
        }),
    }
}
