use std::future::Future;

use chrono::Utc;

use crate::error::AppError;
use crate::models::{Article, Candidate, Language};

/// Placeholder in feed URLs replaced with the current unix time on each fetch.
pub const TIME_PLACEHOLDER: &str = "{{time}}";

/// Replace every [`TIME_PLACEHOLDER`] in `url` with `unix_secs`.
pub fn expand_time_placeholder(url: &str, unix_secs: i64) -> String {
    url.replace(TIME_PLACEHOLDER, &unix_secs.to_string())
}

/// Fetches raw content from a source endpoint.
pub trait Fetcher: Send + Sync + Clone {
    /// Fetch a rendered page.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Fetch a templated feed, stamping the current unix time into the URL.
    fn fetch_feed(&self, url_template: &str) -> impl Future<Output = Result<String, AppError>> + Send {
        let url = expand_time_placeholder(url_template, Utc::now().timestamp());
        async move { self.fetch(&url).await }
    }
}

/// Turns fetched content into article candidates.
pub trait Extractor: Send + Sync {
    /// Extract every candidate from `raw`. An error abandons the whole
    /// batch; nothing is emitted for that cycle.
    fn extract(&self, raw: &str, language: Language) -> Result<Vec<Candidate>, AppError>;
}

/// Persists and looks up articles.
pub trait ArticleStore: Send + Sync + Clone {
    /// Insert a new article in a single transaction. Returns the assigned id.
    fn add(&self, article: &Article) -> impl Future<Output = Result<i64, AppError>> + Send;

    /// First stored article whose title equals `title` or whose body equals `body`.
    ///
    /// Returns [`AppError::RecordNotFound`] when nothing matches.
    fn find_by_title_or_body(
        &self,
        title: &str,
        body: &str,
    ) -> impl Future<Output = Result<Article, AppError>> + Send;

    /// Overwrite title, body and created_at of the record with `article.id`.
    fn update_by_id(&self, article: &Article) -> impl Future<Output = Result<(), AppError>> + Send;
}
