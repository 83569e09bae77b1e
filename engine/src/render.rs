//! Render sink: turns a finished [`Snapshot`] into a document.
//!
//! [`TemplateRenderer`] reads `<dir>/<id>.html` on every call and substitutes
//! `{{ dotted.path }}` placeholders against the snapshot's JSON form. Values are
//! HTML-escaped. Missing or empty values render as [`UNAVAILABLE`], so a field
//! whose source failed still shows up on the page. A placeholder that starts an
//! attribute value (`href="{{ x.link }}"`) renders empty instead.

use std::path::{Path, PathBuf};

use beacon_types::Snapshot;
use serde_json::Value;
use thiserror::Error;

/// Placeholder for a field with no value.
pub const UNAVAILABLE: &str = "unavailable";

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown template id {0:?}")]
    UnknownTemplate(String),
    #[error("failed to read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Accepts a fully assembled snapshot and produces a rendered document.
pub trait RenderSink {
    type Output;

    fn render(&self, template_id: &str, snapshot: &Snapshot) -> Result<Self::Output, RenderError>;
}

#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    dir: PathBuf,
}

impl TemplateRenderer {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn template_path(&self, template_id: &str) -> Result<PathBuf, RenderError> {
        if !is_valid_template_id(template_id) {
            return Err(RenderError::UnknownTemplate(template_id.to_string()));
        }
        Ok(self.dir.join(format!("{template_id}.html")))
    }
}

impl RenderSink for TemplateRenderer {
    type Output = String;

    fn render(&self, template_id: &str, snapshot: &Snapshot) -> Result<String, RenderError> {
        let path = self.template_path(template_id)?;
        let template =
            std::fs::read_to_string(&path).map_err(|source| RenderError::Read { path, source })?;
        let data = serde_json::to_value(snapshot)?;
        Ok(substitute(&template, &data))
    }
}

fn is_valid_template_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Replace every `{{ path }}` in `template` with the escaped value at `path`.
///
/// An unterminated `{{` is copied through unchanged.
#[must_use]
pub fn substitute(template: &str, data: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = after_open[..end].trim();
        let text = lookup(data, key).map(display_value).unwrap_or_default();
        if text.is_empty() {
            // Inside an attribute value the placeholder text would become a bogus URL.
            if !opens_attribute(&out) {
                out.push_str(UNAVAILABLE);
            }
        } else {
            push_escaped(&mut out, &text);
        }
        rest = &after_open[end + CLOSE.len()..];
    }
    out.push_str(rest);
    out
}

fn opens_attribute(out: &str) -> bool {
    out.ends_with("=\"") || out.ends_with("='")
}

fn lookup<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(data, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null | Value::Object(_) => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
