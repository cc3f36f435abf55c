use herald_core::config::{SelectorRules, TitlePolicy};
use herald_core::error::AppError;
use herald_core::models::{Candidate, Language};
use herald_core::traits::Extractor;
use scraper::{ElementRef, Html, Selector};

/// Selector-rule extractor for rendered news pages.
///
/// Every element matching the container selector is one article block;
/// title and body are read from its descendants and the title is cleaned
/// up according to the source's [`TitlePolicy`].
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    container: Selector,
    title: Selector,
    body: Selector,
    distractor: Option<Selector>,
    policy: TitlePolicy,
}

impl HtmlExtractor {
    /// Compile selector rules. Invalid CSS is a configuration error.
    pub fn new(rules: &SelectorRules) -> Result<Self, AppError> {
        Ok(Self {
            container: parse_selector(&rules.container)?,
            title: parse_selector(&rules.title)?,
            body: parse_selector(&rules.body)?,
            distractor: rules.distractor.as_deref().map(parse_selector).transpose()?,
            policy: rules.policy,
        })
    }

    fn extract_blocks(&self, html: &str) -> Vec<Candidate> {
        let document = Html::parse_document(html);
        document
            .select(&self.container)
            .filter_map(|block| {
                let title = child_text(block, &self.title);
                let body = child_text(block, &self.body);
                let title = match self.policy {
                    TitlePolicy::Plain => title,
                    TitlePolicy::StripDistractor => {
                        let distractor = self
                            .distractor
                            .as_ref()
                            .map(|selector| child_text(block, selector))
                            .unwrap_or_default();
                        strip_distractor(&title, &distractor)
                    }
                    TitlePolicy::BracketLabel => bracket_label(&title),
                };
                Candidate::new(title, body)
            })
            .collect()
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, raw: &str, _language: Language) -> Result<Vec<Candidate>, AppError> {
        let candidates = self.extract_blocks(raw);
        tracing::debug!(count = candidates.len(), "Extracted HTML blocks");
        Ok(candidates)
    }
}

fn parse_selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css)
        .map_err(|e| AppError::ConfigError(format!("Invalid CSS selector '{css}': {e}")))
}

/// Concatenated text of every descendant matching `selector`, trimmed.
fn child_text(block: ElementRef<'_>, selector: &Selector) -> String {
    block
        .select(selector)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| *c != ' ' && *c != '\n').collect()
}

/// Remove spaces and newlines from `title`, then every occurrence of the
/// distractor text (typically the publication time shown inside the title).
fn strip_distractor(title: &str, distractor: &str) -> String {
    let title = compact(title);
    let distractor = compact(distractor);
    if distractor.is_empty() {
        title
    } else {
        title.replace(&distractor, "")
    }
}

/// `【label】rest` → `label`. Titles without a closing bracket keep their
/// text, minus any opening bracket.
fn bracket_label(title: &str) -> String {
    let label = title.split('】').next().unwrap_or_default();
    label.replace('【', "").trim().to_string()
}
