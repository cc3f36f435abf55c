use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::{Article, Language};
use crate::traits::{Extractor, Fetcher};

/// Which fetch port call a source uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Plain page fetch.
    Page,
    /// Feed fetch with `{{time}}` expanded in the URL.
    Feed,
}

/// Retry configuration with bounded exponential backoff.
///
/// Delay for attempt `n` (1-indexed) is `initial_delay * multiplier^(n-1)`,
/// capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(300),
            multiplier: 2,
        }
    }
}

impl RetryConfig {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.max(1).saturating_pow(exponent);
        std::cmp::min(self.initial_delay.saturating_mul(factor), self.max_delay)
    }
}

/// Configuration for one source worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub source: String,
    pub url: String,
    pub language: Language,
    pub fetch_mode: FetchMode,
    pub poll_interval: Duration,
    pub retry_config: RetryConfig,
}

impl WorkerConfig {
    pub fn new(
        source: impl Into<String>,
        url: impl Into<String>,
        language: Language,
        fetch_mode: FetchMode,
    ) -> Self {
        Self {
            source: source.into(),
            url: url.into(),
            language,
            fetch_mode,
            poll_interval: Duration::from_secs(60),
            retry_config: RetryConfig::default(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }
}

/// Events emitted by a source worker for monitoring/logging.
#[derive(Debug, Clone)]
pub enum SourceEvent<'a> {
    Started {
        source: &'a str,
    },
    Polled {
        source: &'a str,
        candidates: usize,
    },
    PollFailed {
        source: &'a str,
        error: &'a str,
        /// Whether the error looks transient (network, timeout, 5xx, bad feed).
        retryable: bool,
        attempt: u32,
        retry_in: Duration,
    },
    QueueClosed {
        source: &'a str,
    },
    Stopped {
        source: &'a str,
    },
}

/// Trait for receiving worker events (decoupled logging).
pub trait SourceReporter: Send + Sync {
    fn report(&self, event: SourceEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSourceReporter;

impl SourceReporter for TracingSourceReporter {
    fn report(&self, event: SourceEvent<'_>) {
        match event {
            SourceEvent::Started { source } => {
                tracing::info!(%source, "Source worker started");
            }
            SourceEvent::Polled { source, candidates } => {
                tracing::debug!(%source, %candidates, "Source polled");
            }
            SourceEvent::PollFailed {
                source,
                error,
                retryable: true,
                attempt,
                retry_in,
            } => {
                tracing::warn!(
                    %source,
                    %error,
                    %attempt,
                    retry_in_secs = retry_in.as_secs(),
                    "Poll failed"
                );
            }
            SourceEvent::PollFailed {
                source,
                error,
                retryable: false,
                attempt,
                retry_in,
            } => {
                // Still retried; a 4xx or a broken selector usually needs an operator.
                tracing::error!(
                    %source,
                    %error,
                    %attempt,
                    retry_in_secs = retry_in.as_secs(),
                    "Poll failed with non-transient error"
                );
            }
            SourceEvent::QueueClosed { source } => {
                tracing::error!(%source, "Ingestion queue closed, stopping worker");
            }
            SourceEvent::Stopped { source } => {
                tracing::info!(%source, "Source worker stopped");
            }
        }
    }
}

/// Polls one source and feeds its articles into the ingestion queue.
pub struct SourceWorker<F, E>
where
    F: Fetcher,
    E: Extractor,
{
    fetcher: F,
    extractor: E,
    config: WorkerConfig,
}

impl<F, E> SourceWorker<F, E>
where
    F: Fetcher,
    E: Extractor,
{
    pub fn new(fetcher: F, extractor: E, config: WorkerConfig) -> Self {
        Self {
            fetcher,
            extractor,
            config,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// One fetch → extract pass. Every returned article is stamped with the
    /// source language and the current time.
    pub async fn poll_once(&self) -> Result<Vec<Article>, AppError> {
        let raw = match self.config.fetch_mode {
            FetchMode::Page => self.fetcher.fetch(&self.config.url).await?,
            FetchMode::Feed => self.fetcher.fetch_feed(&self.config.url).await?,
        };

        let language = self.config.language;
        let candidates = self.extractor.extract(&raw, language)?;
        Ok(candidates
            .into_iter()
            .map(|candidate| Article::from_candidate(candidate, language))
            .collect())
    }

    /// Run the poll loop until cancellation.
    ///
    /// Articles from one cycle are sent in extraction order; a full queue
    /// suspends the worker until the sink catches up. Failed cycles are
    /// retried after the backoff delay, with no retry limit.
    pub async fn run<R: SourceReporter>(
        &self,
        queue: mpsc::Sender<Article>,
        cancel_token: CancellationToken,
        reporter: &R,
    ) -> Result<(), AppError> {
        let source = self.config.source.as_str();
        reporter.report(SourceEvent::Started { source });

        let mut failures: u32 = 0;
        let result = 'poll: loop {
            if cancel_token.is_cancelled() {
                break 'poll Ok(());
            }

            let polled = tokio::select! {
                polled = self.poll_once() => polled,
                () = cancel_token.cancelled() => break 'poll Ok(()),
            };

            let delay = match polled {
                Ok(articles) => {
                    failures = 0;
                    reporter.report(SourceEvent::Polled {
                        source,
                        candidates: articles.len(),
                    });
                    for article in articles {
                        tokio::select! {
                            sent = queue.send(article) => {
                                if sent.is_err() {
                                    reporter.report(SourceEvent::QueueClosed { source });
                                    break 'poll Err(AppError::ChannelClosed);
                                }
                            }
                            () = cancel_token.cancelled() => break 'poll Ok(()),
                        }
                    }
                    self.config.poll_interval
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let retry_in = self.config.retry_config.delay_for_attempt(failures);
                    let error = e.to_string();
                    reporter.report(SourceEvent::PollFailed {
                        source,
                        error: &error,
                        retryable: e.is_retryable(),
                        attempt: failures,
                        retry_in,
                    });
                    retry_in
                }
            };

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = cancel_token.cancelled() => break 'poll Ok(()),
            }
        };

        reporter.report(SourceEvent::Stopped { source });
        result
    }
}
