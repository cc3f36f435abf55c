pub mod config;
pub mod error;
pub mod lexicon;
pub mod models;
pub mod sink;
pub mod template;
pub mod traits;
pub mod worker;

#[cfg(test)]
mod testutil;

pub use config::{HeraldConfig, SelectorRules, SourceConfig, SourceKind, TitlePolicy};
pub use error::AppError;
pub use lexicon::{LanguagePostProcessor, Substitution};
pub use models::{AUTHOR, Article, Candidate, Language};
pub use sink::{IngestOutcome, IngestStats, IngestionSink};
pub use template::TemplateResolver;
pub use traits::{ArticleStore, Extractor, Fetcher};
pub use worker::{SourceWorker, TracingSourceReporter, WorkerConfig};
