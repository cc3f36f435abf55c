//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::{Article, Candidate, Language};
use crate::traits::{ArticleStore, Extractor, Fetcher};
use crate::worker::{SourceEvent, SourceReporter};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns queued responses and records requested URLs.
#[derive(Clone)]
pub struct MockFetcher {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns a default HTML string.
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    pub requested: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(body: &str) -> Self {
        Self::with_responses(vec![Ok(body.to_string())])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.requested.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("<html><body>default</body></html>".to_string())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor that returns queued candidate batches.
#[derive(Clone)]
pub struct MockExtractor {
    /// Each call pops the first element; once empty, every call repeats `fallback`.
    responses: Arc<Mutex<Vec<Result<Vec<Candidate>, AppError>>>>,
    fallback: Vec<Candidate>,
}

impl MockExtractor {
    /// Always returns `candidates`.
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            fallback: candidates,
        }
    }

    /// Returns `responses` in order, then empty batches.
    pub fn with_responses(responses: Vec<Result<Vec<Candidate>, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            fallback: Vec::new(),
        }
    }
}

impl Extractor for MockExtractor {
    fn extract(&self, _raw: &str, _language: Language) -> Result<Vec<Candidate>, AppError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.fallback.clone())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockArticleStore
// ---------------------------------------------------------------------------

/// In-memory store with sequential ids and one-shot injectable errors.
#[derive(Clone)]
pub struct MockArticleStore {
    pub rows: Arc<Mutex<Vec<Article>>>,
    add_error: Arc<Mutex<Option<AppError>>>,
    find_error: Arc<Mutex<Option<AppError>>>,
}

impl MockArticleStore {
    pub fn empty() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
            add_error: Arc::new(Mutex::new(None)),
            find_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Store whose next `add` fails.
    pub fn with_add_error(error: AppError) -> Self {
        let store = Self::empty();
        *store.add_error.lock().unwrap() = Some(error);
        store
    }

    /// Store whose next lookup fails with something other than "not found".
    pub fn with_find_error(error: AppError) -> Self {
        let store = Self::empty();
        *store.find_error.lock().unwrap() = Some(error);
        store
    }
}

impl ArticleStore for MockArticleStore {
    async fn add(&self, article: &Article) -> Result<i64, AppError> {
        if let Some(e) = self.add_error.lock().unwrap().take() {
            return Err(e);
        }
        let mut rows = self.rows.lock().unwrap();
        let id = rows.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        rows.push(Article {
            id,
            ..article.clone()
        });
        Ok(id)
    }

    async fn find_by_title_or_body(&self, title: &str, body: &str) -> Result<Article, AppError> {
        if let Some(e) = self.find_error.lock().unwrap().take() {
            return Err(e);
        }
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.title == title || a.body == body)
            .cloned()
            .ok_or(AppError::RecordNotFound)
    }

    async fn update_by_id(&self, article: &Article) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|a| a.id == article.id)
            .ok_or(AppError::RecordNotFound)?;
        row.title = article.title.clone();
        row.body = article.body.clone();
        row.created_at = article.created_at;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock source reporter that records event labels and, per failed poll,
/// whether the error was classified as retryable.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
    pub failures: Arc<Mutex<Vec<bool>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceReporter for MockReporter {
    fn report(&self, event: SourceEvent<'_>) {
        if let SourceEvent::PollFailed { retryable, .. } = &event {
            self.failures.lock().unwrap().push(*retryable);
        }
        let label = match &event {
            SourceEvent::Started { .. } => "Started",
            SourceEvent::Polled { .. } => "Polled",
            SourceEvent::PollFailed { .. } => "PollFailed",
            SourceEvent::QueueClosed { .. } => "QueueClosed",
            SourceEvent::Stopped { .. } => "Stopped",
        };
        self.events.lock().unwrap().push(label.to_string());
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Create an unpersisted Chinese article.
pub fn make_test_article(title: &str, body: &str) -> Article {
    let candidate = Candidate::new(title, body).expect("test article needs title and body");
    Article::from_candidate(candidate, Language::Chinese)
}
