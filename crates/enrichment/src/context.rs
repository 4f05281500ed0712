//! Template contexts, the output of every fetcher.
//!
//! A context is a JSON object keyed by field name. Fetchers build one with
//! [`TemplateContextBuilder`]: aggregates are spread in first, then derived
//! fields are layered on top, later fields replacing earlier ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EnrichmentError, Result};

/// The data object handed to a template engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateContext(Map<String, Value>);

impl TemplateContext {
    /// An empty context, produced for unknown events.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Starts building a context.
    pub fn builder() -> TemplateContextBuilder {
        TemplateContextBuilder::new()
    }

    /// Wraps an existing JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Interprets a JSON value as a context. Non-objects yield `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The recipient address, if the context carries a string `email`.
    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<TemplateContext> for Value {
    fn from(context: TemplateContext) -> Self {
        context.into_value()
    }
}

/// Builds a [`TemplateContext`] field by field.
#[derive(Debug, Default)]
pub struct TemplateContextBuilder {
    fields: Map<String, Value>,
}

impl TemplateContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies every top-level field of `value` into the context.
    ///
    /// `value` must serialize to a JSON object; `what` names it in the error.
    pub fn spread(mut self, what: &'static str, value: &impl Serialize) -> Result<Self> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => {
                self.fields.extend(fields);
                Ok(self)
            }
            _ => Err(EnrichmentError::NotAnObject(what)),
        }
    }

    /// Sets one field, replacing any earlier value.
    pub fn field(mut self, name: &str, value: impl Serialize) -> Result<Self> {
        self.fields
            .insert(name.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn build(self) -> TemplateContext {
        TemplateContext(self.fields)
    }
}

/// Normalizes a product thumbnail URL for email clients.
///
/// Protocol-relative URLs get an `https:` scheme; absent or empty
/// thumbnails stay absent.
pub fn normalize_thumbnail(thumbnail: Option<&str>) -> Option<String> {
    match thumbnail {
        None | Some("") => None,
        Some(url) if url.starts_with("http") => Some(url.to_string()),
        Some(url) if url.starts_with("//") => Some(format!("https:{url}")),
        Some(url) => Some(url.to_string()),
    }
}

/// Formats a timestamp as a short human date, e.g. `"Tue Mar 05 2024"`.
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%a %b %d %Y").to_string()
}
