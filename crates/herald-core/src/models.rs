use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Author recorded on every ingested article.
pub const AUTHOR: &str = "admin";

/// Language tag of an article, persisted as `1` (Chinese) or `2` (English).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Chinese,
    English,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Chinese => "chinese",
            Language::English => "english",
        }
    }

    /// Numeric code used by the persisted record.
    pub fn code(&self) -> i16 {
        match self {
            Language::Chinese => 1,
            Language::English => 2,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Language::Chinese),
            2 => Some(Language::English),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A (title, body) pair produced by an extractor, before the worker
/// stamps source metadata onto it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub title: String,
    pub body: String,
}

impl Candidate {
    /// Returns `None` when either field is empty; such candidates are
    /// dropped silently rather than reported as errors.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Option<Self> {
        let title = title.into();
        let body = body.into();
        if title.is_empty() || body.is_empty() {
            return None;
        }
        Some(Self { title, body })
    }
}

/// Canonical news record, as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Store-assigned id; `0` means not yet persisted.
    pub id: i64,
    pub author: String,
    pub title: String,
    pub body: String,
    pub language: Language,
    /// Unix seconds. Set at emission, refreshed on update.
    pub created_at: i64,
}

impl Article {
    /// Build an unpersisted article from an extracted candidate, stamped now.
    pub fn from_candidate(candidate: Candidate, language: Language) -> Self {
        Self {
            id: 0,
            author: AUTHOR.to_string(),
            title: candidate.title,
            body: candidate.body,
            language,
            created_at: Utc::now().timestamp(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}
