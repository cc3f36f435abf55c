use chrono::Utc;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::models::Article;
use crate::traits::ArticleStore;

/// What the sink did with one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Inserted(i64),
    /// An existing record with the same title or body was overwritten.
    Updated(i64),
}

/// Counters reported when the ingestion queue closes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub inserted: u64,
    pub updated: u64,
    pub failed: u64,
}

/// Single consumer persisting queued articles with dedup-or-update semantics.
///
/// An article matches a stored record when either the title or the body is
/// equal. A match overwrites the record's title, body and timestamp; no
/// field-level merge happens.
// NOTE: matching on title OR body can fold two unrelated articles that share
// a headline into one row. Kept as-is until the intended key is settled.
pub struct IngestionSink<S: ArticleStore> {
    store: S,
}

impl<S: ArticleStore> IngestionSink<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persist one article, updating a matching record if there is one.
    pub async fn ingest(&self, article: Article) -> Result<IngestOutcome, AppError> {
        match self
            .store
            .find_by_title_or_body(&article.title, &article.body)
            .await
        {
            Ok(existing) if existing.is_persisted() => {
                let updated = Article {
                    id: existing.id,
                    created_at: Utc::now().timestamp(),
                    ..article
                };
                self.store.update_by_id(&updated).await?;
                Ok(IngestOutcome::Updated(existing.id))
            }
            Ok(_) => self.insert(&article).await,
            Err(e) if e.is_not_found() => self.insert(&article).await,
            Err(e) => Err(e),
        }
    }

    async fn insert(&self, article: &Article) -> Result<IngestOutcome, AppError> {
        let id = self.store.add(article).await?;
        Ok(IngestOutcome::Inserted(id))
    }

    /// Drain the queue in arrival order until every producer has hung up.
    ///
    /// Store failures are logged and the article is dropped.
    pub async fn run(&self, mut queue: mpsc::Receiver<Article>) -> IngestStats {
        let mut stats = IngestStats::default();

        while let Some(article) = queue.recv().await {
            let title = article.title.clone();
            match self.ingest(article).await {
                Ok(IngestOutcome::Inserted(id)) => {
                    stats.inserted += 1;
                    tracing::debug!(%id, %title, "Article inserted");
                }
                Ok(IngestOutcome::Updated(id)) => {
                    stats.updated += 1;
                    tracing::debug!(%id, %title, "Article updated");
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!(error = %e, %title, "Failed to persist article, dropping it");
                }
            }
        }

        tracing::info!(
            inserted = stats.inserted,
            updated = stats.updated,
            failed = stats.failed,
            "Ingestion queue closed"
        );
        stats
    }
}
