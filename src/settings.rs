//! Language settings registry: default, enabled and right-to-left locales.

use serde::{
    Deserialize,
    Serialize,
};

use crate::config::ValidationError;

/// Text direction of a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

/// Process-wide language configuration, persisted with the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSettings {
    pub default_language: String,
    pub available_languages: Vec<String>,
    pub rtl_languages: Vec<String>,
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            available_languages: vec!["en".to_string(), "ar".to_string()],
            rtl_languages: vec!["ar".to_string()],
        }
    }
}

impl LanguageSettings {
    /// # Errors
    /// - No available languages, or duplicates among them
    /// - Malformed locale code
    /// - Default or RTL language outside the available set
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.available_languages.is_empty() {
            errors.push(ValidationError::new(
                "availableLanguages",
                "At least one language is required. Example: [\"en\", \"ar\"]",
            ));
        }

        for (index, code) in self.available_languages.iter().enumerate() {
            if !is_valid_locale_code(code) {
                errors.push(ValidationError::new(
                    format!("availableLanguages[{index}]"),
                    format!("Invalid locale code '{code}'"),
                ));
            } else if self.available_languages.iter().take(index).any(|other| other == code) {
                errors.push(ValidationError::new(
                    format!("availableLanguages[{index}]"),
                    format!("Duplicate locale code '{code}'"),
                ));
            }
        }

        if !self.is_available(&self.default_language) {
            errors.push(ValidationError::new(
                "defaultLanguage",
                format!(
                    "The default language '{}' must be one of the available languages",
                    self.default_language
                ),
            ));
        }

        for (index, code) in self.rtl_languages.iter().enumerate() {
            if !self.is_available(code) {
                errors.push(ValidationError::new(
                    format!("rtlLanguages[{index}]"),
                    format!("The RTL language '{code}' must be one of the available languages"),
                ));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Whether `code` is enabled.
    #[must_use]
    pub fn is_available(&self, code: &str) -> bool {
        self.available_languages.iter().any(|available| available == code)
    }

    /// Whether `code` is written right to left.
    #[must_use]
    pub fn is_rtl(&self, code: &str) -> bool {
        self.rtl_languages.iter().any(|rtl| rtl == code)
    }

    /// テキストの向き
    #[must_use]
    pub fn direction(&self, code: &str) -> TextDirection {
        if self.is_rtl(code) { TextDirection::Rtl } else { TextDirection::Ltr }
    }
}

/// Locale codes contain only ASCII alphanumerics, hyphens and underscores (`en`, `ar-SA`, `zh_Hans`).
#[must_use]
pub fn is_valid_locale_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    fn settings(default: &str, available: &[&str], rtl: &[&str]) -> LanguageSettings {
        LanguageSettings {
            default_language: default.to_string(),
            available_languages: available.iter().copied().map(String::from).collect(),
            rtl_languages: rtl.iter().copied().map(String::from).collect(),
        }
    }

    #[rstest]
    fn default_settings_are_valid() {
        let settings = LanguageSettings::default();

        assert_that!(settings.validate(), ok(anything()));
        assert_that!(settings.direction("ar"), eq(TextDirection::Rtl));
        assert_that!(settings.direction("en"), eq(TextDirection::Ltr));
    }

    #[rstest]
    fn default_language_must_be_available() {
        let result = settings("fr", &["en", "ar"], &["ar"]).validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("defaultLanguage")),
                field!(ValidationError.message, contains_substring("'fr'"))
            ]])
        );
    }

    #[rstest]
    fn rtl_languages_must_be_available() {
        let result = settings("en", &["en"], &["ar"]).validate();

        assert_that!(
            result,
            err(elements_are![field!(ValidationError.field_path, eq("rtlLanguages[0]"))])
        );
    }

    #[rstest]
    fn available_languages_cannot_be_empty() {
        let result = settings("en", &[], &[]).validate();

        assert_that!(
            result,
            err(elements_are![
                field!(ValidationError.field_path, eq("availableLanguages")),
                field!(ValidationError.field_path, eq("defaultLanguage"))
            ])
        );
    }

    #[rstest]
    fn duplicate_and_malformed_codes_are_reported() {
        let result = settings("en", &["en", "ar", "en", "ar SA"], &[]).validate();

        assert_that!(
            result,
            err(elements_are![
                all![
                    field!(ValidationError.field_path, eq("availableLanguages[2]")),
                    field!(ValidationError.message, contains_substring("Duplicate"))
                ],
                all![
                    field!(ValidationError.field_path, eq("availableLanguages[3]")),
                    field!(ValidationError.message, contains_substring("Invalid locale code"))
                ]
            ])
        );
    }

    #[rstest]
    #[case::simple("en", true)]
    #[case::region("ar-SA", true)]
    #[case::underscore("zh_Hans", true)]
    #[case::empty("", false)]
    #[case::space("ar SA", false)]
    #[case::symbol("en@US", false)]
    fn locale_code_format(#[case] code: &str, #[case] expected: bool) {
        assert_eq!(is_valid_locale_code(code), expected);
    }

    #[rstest]
    fn deserializes_camel_case() {
        let json = r#"{"defaultLanguage":"ar","availableLanguages":["ar","en"],"rtlLanguages":["ar"]}"#;

        let settings: LanguageSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.default_language, eq("ar"));
        assert_that!(settings.validate(), ok(anything()));
    }
}
