//! Lexical clean-up for English-tagged feed output.
//!
//! Some English feeds still carry a few Chinese numerals and trend words
//! (`三`, `下降`, ...). The post-processor rewrites them with a fixed,
//! ordered substitution table. The table is plain data so deployments can
//! audit or extend it from the config file.

use serde::{Deserialize, Serialize};

use crate::models::Language;

/// One glyph → replacement rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub glyph: String,
    pub replacement: String,
}

impl Substitution {
    pub fn new(glyph: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            glyph: glyph.into(),
            replacement: replacement.into(),
        }
    }
}

/// Applies the substitution table to English output; identity for Chinese.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguagePostProcessor {
    table: Vec<Substitution>,
}

impl LanguagePostProcessor {
    pub fn new(table: Vec<Substitution>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &[Substitution] {
        &self.table
    }

    /// Rewrite `title` and `body` for `language`.
    pub fn apply(&self, title: &str, body: &str, language: Language) -> (String, String) {
        match language {
            Language::Chinese => (title.to_string(), body.to_string()),
            Language::English => (self.rewrite(title), self.rewrite(body)),
        }
    }

    fn rewrite(&self, text: &str) -> String {
        self.table
            .iter()
            .filter(|rule| !rule.glyph.is_empty())
            .fold(text.to_string(), |acc, rule| {
                acc.replace(&rule.glyph, &rule.replacement)
            })
    }
}

impl Default for LanguagePostProcessor {
    fn default() -> Self {
        Self::new(vec![
            Substitution::new("一", "1 "),
            Substitution::new("二", "2 "),
            Substitution::new("三", "3 "),
            Substitution::new("四", "4 "),
            Substitution::new("五", "5 "),
            Substitution::new("下降", "down "),
            Substitution::new("上升", "up "),
        ])
    }
}
