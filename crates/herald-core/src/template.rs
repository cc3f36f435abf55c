//! Resolution of templated JSON feeds into article candidates.
//!
//! A feed ships rendering templates and data items separately:
//!
//! ```text
//! {
//!   "templates": [{"id": 7, "content": {"0": "Top {{n}}\nRanking:", "1": "{{name}}: {{price}}"}}],
//!   "items":     [{"templateId": 7, "data": {"rows": [{"n": "2", "name": "BTC", "price": 100}]}}]
//! }
//! ```
//!
//! Content `"0"` carries the title line and the body seed line; `"1"` is the
//! append template rendered once per element of a repeatable block. Each
//! template is paired with the first item naming its id and resolves to at
//! most one candidate per pass.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::lexicon::LanguagePostProcessor;
use crate::models::{Candidate, Language};
use crate::traits::Extractor;

/// Line separator of resolved bodies: a literal backslash followed by `n`,
/// matching how stored article text encodes line breaks.
pub const ESCAPED_NEWLINE: &str = "\\n";

/// A parsed feed. Only lives for one resolution pass.
#[derive(Debug, Clone, Deserialize)]
pub struct Feed {
    pub templates: Vec<Template>,
    pub items: Vec<Item>,
}

impl Feed {
    /// Parse raw feed bytes. Fails if the payload is not a JSON object or
    /// lacks either the `templates` or the `items` array.
    pub fn from_slice(raw: &[u8]) -> Result<Self, AppError> {
        serde_json::from_slice(raw).map_err(|e| AppError::ParseError(e.to_string()))
    }
}

/// One feed template. Decoded leniently: a wrong-typed `id` or `content`
/// leaves that field empty instead of failing the whole feed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct Template {
    /// `None` unless the feed gave an integer; such templates match no item.
    pub id: Option<i64>,
    pub content: Map<String, Value>,
}

impl From<Value> for Template {
    fn from(value: Value) -> Self {
        Self {
            id: value.get("id").and_then(Value::as_i64),
            content: object_field(&value, "content"),
        }
    }
}

/// The pieces a template's content splits into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateParts<'a> {
    pub title: &'a str,
    pub seed: &'a str,
    pub append: Option<&'a str>,
}

impl Template {
    /// Split the content into title line, body seed and append template.
    ///
    /// The content lines are the lines of `"0"`. When `"0"` is a single line,
    /// `"1"` serves as the second line and there is no append template.
    /// Returns `None` for templates with fewer than two content lines.
    pub fn parts(&self) -> Option<TemplateParts<'_>> {
        let primary = self.content.get("0").and_then(Value::as_str)?;
        let append = self.content.get("1").and_then(Value::as_str);

        let mut lines = primary.split('\n');
        let title = lines.next()?;
        match lines.next() {
            Some(seed) => Some(TemplateParts {
                title,
                seed,
                append,
            }),
            None => append.map(|seed| TemplateParts {
                title,
                seed,
                append: None,
            }),
        }
    }
}

/// One feed data item, decoded as leniently as [`Template`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct Item {
    pub template_id: Option<i64>,
    pub data: BTreeMap<String, FieldValue>,
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Self {
            template_id: value.get("templateId").and_then(Value::as_i64),
            data: object_field(&value, "data")
                .into_iter()
                .map(|(key, v)| (key, FieldValue::from(v)))
                .collect(),
        }
    }
}

/// `value[key]` when it is an object, otherwise an empty map.
fn object_field(value: &Value, key: &str) -> Map<String, Value> {
    value
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Shape of one `data` entry of an item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum FieldValue {
    /// Nested record whose fields fill placeholders of the same names.
    Record(Map<String, Value>),
    /// Repeatable block; each record renders one append-template line.
    RecordList(Vec<Map<String, Value>>),
    /// Anything else fills the placeholder named by the entry's key.
    Scalar(Value),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(record) => FieldValue::Record(record),
            Value::Array(elements) if elements.iter().all(Value::is_object) => {
                FieldValue::RecordList(
                    elements
                        .into_iter()
                        .filter_map(|element| match element {
                            Value::Object(record) => Some(record),
                            _ => None,
                        })
                        .collect(),
                )
            }
            other => FieldValue::Scalar(other),
        }
    }
}

/// Render a JSON value as placeholder text: numbers in canonical decimal
/// form, strings verbatim, everything else empty.
pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

/// Replace every `{{name}}` in `text` with `value`.
pub fn substitute(text: &str, name: &str, value: &str) -> String {
    text.replace(&format!("{{{{{name}}}}}"), value)
}

/// Resolves templated feeds into candidates, post-processing English output.
#[derive(Debug, Clone, Default)]
pub struct TemplateResolver {
    post_processor: LanguagePostProcessor,
}

impl TemplateResolver {
    pub fn new(post_processor: LanguagePostProcessor) -> Self {
        Self { post_processor }
    }

    /// Resolve one feed payload. Either the whole feed parses and every
    /// resolvable template yields a candidate, or nothing is returned.
    pub fn resolve(&self, raw: &[u8], language: Language) -> Result<Vec<Candidate>, AppError> {
        let feed = Feed::from_slice(raw)?;
        let candidates: Vec<Candidate> = feed
            .templates
            .iter()
            .filter_map(|template| self.resolve_template(template, &feed.items, language))
            .collect();

        tracing::debug!(
            templates = feed.templates.len(),
            items = feed.items.len(),
            resolved = candidates.len(),
            "Resolved feed"
        );
        Ok(candidates)
    }

    fn resolve_template(
        &self,
        template: &Template,
        items: &[Item],
        language: Language,
    ) -> Option<Candidate> {
        let id = template.id?;
        let parts = template.parts()?;
        let item = items.iter().find(|item| item.template_id == Some(id))?;

        let mut title = parts.title.to_string();
        let mut seed = parts.seed.to_string();
        let mut lines = Vec::new();

        for (key, value) in &item.data {
            match value {
                FieldValue::Scalar(v) => {
                    let rendered = render_scalar(v);
                    title = substitute(&title, key, &rendered);
                    seed = substitute(&seed, key, &rendered);
                }
                FieldValue::Record(fields) => {
                    for (name, v) in fields {
                        let rendered = render_scalar(v);
                        title = substitute(&title, name, &rendered);
                        seed = substitute(&seed, name, &rendered);
                    }
                }
                FieldValue::RecordList(records) => {
                    // Title placeholders take the last element's value.
                    let mut latest: BTreeMap<&str, String> = BTreeMap::new();
                    for record in records {
                        let mut line = parts.append.map(str::to_string);
                        for (name, v) in record {
                            let rendered = render_scalar(v);
                            if let Some(l) = line.as_mut() {
                                *l = substitute(l, name, &rendered);
                            }
                            latest.insert(name.as_str(), rendered);
                        }
                        if let Some(line) = line.filter(|l| !l.is_empty()) {
                            lines.push(line);
                        }
                    }
                    for (name, rendered) in &latest {
                        title = substitute(&title, name, rendered);
                    }
                }
            }
        }

        let body = std::iter::once(seed)
            .chain(lines)
            .collect::<Vec<_>>()
            .join(ESCAPED_NEWLINE);

        let (title, body) = self.post_processor.apply(&title, &body, language);
        Candidate::new(title, body)
    }
}

impl Extractor for TemplateResolver {
    fn extract(&self, raw: &str, language: Language) -> Result<Vec<Candidate>, AppError> {
        self.resolve(raw.as_bytes(), language)
    }
}
