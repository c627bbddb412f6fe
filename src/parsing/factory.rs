//! Language parser factory with configuration-based instantiation.
//!
//! Creates LanguageParser instances based on Language enum and Settings.
//! Validates language enablement and provides discovery of supported languages.

use super::{
    CParser, CppParser, JavaScriptParser, Language, LanguageParser, PythonParser, TypeScriptParser,
};
use crate::Settings;
use crate::error::{ParseError, ParseResult};
use std::sync::Arc;

/// Parser factory that creates LanguageParser instances based on configuration.
#[derive(Debug, Clone)]
pub struct ParserFactory {
    settings: Arc<Settings>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new(Arc::new(Settings::default()))
    }
}

impl ParserFactory {
    /// Creates factory instance with shared configuration.
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Creates parser instance for the specified language.
    ///
    /// Fails with `UnsupportedLanguage` when the language is disabled.
    #[must_use = "Parser creation may fail and should be handled"]
    pub fn create_parser(&self, language: Language) -> ParseResult<Box<dyn LanguageParser>> {
        if !self.is_language_enabled(language) {
            return Err(ParseError::UnsupportedLanguage {
                language: format!("{} (disabled in configuration)", language.name()),
            });
        }

        let init_error = |reason: String| ParseError::ParserInit {
            language: language.name().to_string(),
            reason,
        };

        Ok(match language {
            Language::C => Box::new(CParser::new().map_err(init_error)?),
            Language::Cpp => Box::new(CppParser::new().map_err(init_error)?),
            Language::Python => Box::new(PythonParser::new().map_err(init_error)?),
            Language::JavaScript => Box::new(JavaScriptParser::new().map_err(init_error)?),
            Language::TypeScript => Box::new(TypeScriptParser::new().map_err(init_error)?),
        })
    }

    /// Checks if language is enabled in configuration.
    ///
    /// Languages missing from the settings map count as enabled.
    pub fn is_language_enabled(&self, language: Language) -> bool {
        self.settings
            .languages
            .get(language.config_key())
            .is_none_or(|config| config.enabled)
    }

    /// Returns list of all enabled languages from configuration.
    pub fn enabled_languages(&self) -> Vec<Language> {
        Language::ALL
            .iter()
            .copied()
            .filter(|&lang| self.is_language_enabled(lang))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_every_parser() {
        let factory = ParserFactory::default();
        for language in Language::ALL {
            let parser = factory.create_parser(language).unwrap();
            assert_eq!(parser.language(), language);
        }
        assert_eq!(factory.enabled_languages().len(), Language::ALL.len());
    }

    #[test]
    fn test_disabled_language() {
        let mut settings = Settings::default();
        if let Some(python) = settings.languages.get_mut("python") {
            python.enabled = false;
        }

        let factory = ParserFactory::new(Arc::new(settings));
        let result = factory.create_parser(Language::Python);

        assert!(
            matches!(result, Err(ParseError::UnsupportedLanguage { language }) if language.contains("disabled"))
        );
        assert!(!factory.enabled_languages().contains(&Language::Python));
    }
}
