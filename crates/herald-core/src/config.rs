use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;
use crate::lexicon::LanguagePostProcessor;
use crate::models::Language;
use crate::traits::expand_time_placeholder;
use crate::worker::{FetchMode, RetryConfig, WorkerConfig};

const DEFAULT_QUEUE_CAPACITY: usize = 64;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Top-level configuration: the sources to poll and pipeline knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeraldConfig {
    pub sources: Vec<SourceConfig>,
    /// Capacity of the ingestion queue. A full queue blocks producers.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Substitution table for English-tagged feed output.
    #[serde(default)]
    pub lexicon: LanguagePostProcessor,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

/// One polled endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Endpoint URL. `{{time}}` is replaced with unix seconds on each feed fetch.
    pub url: String,
    pub language: Language,
    pub kind: SourceKind,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub backoff: BackoffConfig,
}

/// How a source's content is turned into candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceKind {
    /// Rendered HTML page scraped with selector rules.
    Html { rules: SelectorRules },
    /// Templated JSON feed.
    TemplateFeed,
}

/// CSS selectors locating article blocks on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorRules {
    /// Selector for each article block.
    pub container: String,
    /// Title, relative to the container.
    pub title: String,
    /// Body, relative to the container.
    pub body: String,
    /// Text removed from the title (e.g. an embedded timestamp).
    #[serde(default)]
    pub distractor: Option<String>,
    #[serde(default)]
    pub policy: TitlePolicy,
}

/// Site-specific title clean-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitlePolicy {
    #[default]
    Plain,
    /// Drop whitespace and the distractor text from the title.
    StripDistractor,
    /// `【label】rest` → `label`.
    BracketLabel,
}

/// Retry backoff as it appears in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    pub initial_delay_secs: u64,
    pub max_delay_secs: u64,
    pub multiplier: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: 60,
            max_delay_secs: 300,
            multiplier: 2,
        }
    }
}

impl From<&BackoffConfig> for RetryConfig {
    fn from(cfg: &BackoffConfig) -> Self {
        RetryConfig {
            initial_delay: Duration::from_secs(cfg.initial_delay_secs),
            max_delay: Duration::from_secs(cfg.max_delay_secs),
            multiplier: cfg.multiplier,
        }
    }
}

impl SourceConfig {
    pub fn fetch_mode(&self) -> FetchMode {
        match self.kind {
            SourceKind::Html { .. } => FetchMode::Page,
            SourceKind::TemplateFeed => FetchMode::Feed,
        }
    }

    /// Runtime worker settings for this source.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig::new(&self.name, &self.url, self.language, self.fetch_mode())
            .with_poll_interval(Duration::from_secs(self.poll_interval_secs))
            .with_retry_config(RetryConfig::from(&self.backoff))
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::ConfigError("source name must not be empty".into()));
        }
        let expanded = expand_time_placeholder(&self.url, 0);
        let parsed = Url::parse(&expanded).map_err(|e| {
            AppError::ConfigError(format!("source '{}': invalid URL '{}': {e}", self.name, self.url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::ConfigError(format!(
                "source '{}': URL scheme '{}' is not allowed (only http/https)",
                self.name,
                parsed.scheme()
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(AppError::ConfigError(format!(
                "source '{}': poll_interval_secs must be at least 1",
                self.name
            )));
        }
        if self.backoff.multiplier == 0 || self.backoff.initial_delay_secs > self.backoff.max_delay_secs {
            return Err(AppError::ConfigError(format!(
                "source '{}': backoff needs multiplier >= 1 and initial_delay_secs <= max_delay_secs",
                self.name
            )));
        }
        if let SourceKind::Html { rules } = &self.kind {
            if rules.policy == TitlePolicy::StripDistractor && rules.distractor.is_none() {
                return Err(AppError::ConfigError(format!(
                    "source '{}': strip_distractor policy requires a distractor selector",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

impl HeraldConfig {
    /// Load and validate a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let config: HeraldConfig = serde_json::from_str(raw)
            .map_err(|e| AppError::ConfigError(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.sources.is_empty() {
            return Err(AppError::ConfigError("no sources configured".into()));
        }
        if self.queue_capacity == 0 {
            return Err(AppError::ConfigError("queue_capacity must be at least 1".into()));
        }
        let mut seen = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !seen.insert(source.name.as_str()) {
                return Err(AppError::ConfigError(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
        }
        Ok(())
    }

    /// The sources Herald polls when no config file is given: two flash-news
    /// pages and the English and Chinese editions of a templated feed.
    pub fn builtin() -> Self {
        let backoff = BackoffConfig::default();
        Self {
            sources: vec![
                SourceConfig {
                    name: "bishijie".into(),
                    url: "https://www.bishijie.com/kuaixun/".into(),
                    language: Language::Chinese,
                    kind: SourceKind::Html {
                        rules: SelectorRules {
                            container: ".content".into(),
                            title: "h3".into(),
                            body: ".h63".into(),
                            distractor: Some("span".into()),
                            policy: TitlePolicy::StripDistractor,
                        },
                    },
                    poll_interval_secs: 30,
                    backoff: backoff.clone(),
                },
                SourceConfig {
                    name: "8btc".into(),
                    url: "https://www.8btc.com/flash".into(),
                    language: Language::Chinese,
                    kind: SourceKind::Html {
                        rules: SelectorRules {
                            container: ".flash-wrap".into(),
                            title: ".flash-item__title".into(),
                            body: ".flash-item__content".into(),
                            distractor: None,
                            policy: TitlePolicy::BracketLabel,
                        },
                    },
                    poll_interval_secs: 10,
                    backoff: backoff.clone(),
                },
                SourceConfig {
                    name: "tokenview-en".into(),
                    url: "https://tokenview.com/v2api/news/list/all/{{time}}/en".into(),
                    language: Language::English,
                    kind: SourceKind::TemplateFeed,
                    poll_interval_secs: 100,
                    backoff: backoff.clone(),
                },
                SourceConfig {
                    name: "tokenview-cn".into(),
                    url: "https://tokenview.com/v2api/news/list/all/{{time}}/cn".into(),
                    language: Language::Chinese,
                    kind: SourceKind::TemplateFeed,
                    poll_interval_secs: 100,
                    backoff,
                },
            ],
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            lexicon: LanguagePostProcessor::default(),
        }
    }
}
