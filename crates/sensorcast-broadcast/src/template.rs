use serde_json::{Map, Value};

use crate::error::{RenderError, TemplateError};

/// Built-in template used when a stream does not name a template file.
pub const DEFAULT_TEMPLATE: &str = r#"{"count":{{count}},"timestamp":"{{timestamp}}","sensor":"{{{sensor}}}","value":{{value}}}"#;

/// Turns one tick's payload into the message sent to subscribers.
///
/// Implementations must be pure: the payload is borrowed and never mutated.
pub trait Renderer: Send + Sync {
    fn render(&self, payload: &Map<String, Value>) -> Result<String, RenderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Escaped(String),
    Raw(String),
}

/// A compiled Mustache template, variables only.
///
/// Supported tags: `{{name}}` (HTML-escaped), `{{{name}}}` and `{{& name}}`
/// (verbatim), `{{! comment}}`. Escaping follows mustache.js and covers
/// `&`, `<`, `>`, `"`, `'`, `/`, `` ` `` and `=`. Rendering a variable missing from the
/// payload is an error rather than an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Text(rest[..open].to_string()));
            }
            let tag_start = offset + open;
            let after = &rest[open + 2..];

            let (body, consumed, triple) = if let Some(inner) = after.strip_prefix('{') {
                let close = inner
                    .find("}}}")
                    .ok_or(TemplateError::Unclosed { offset: tag_start })?;
                (&inner[..close], open + 3 + close + 3, true)
            } else {
                let close = after
                    .find("}}")
                    .ok_or(TemplateError::Unclosed { offset: tag_start })?;
                (&after[..close], open + 2 + close + 2, false)
            };

            if let Some(segment) = parse_tag(body.trim(), triple, tag_start)? {
                segments.push(segment);
            }
            rest = &rest[consumed..];
            offset += consumed;
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Names of every variable the template references, in order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Escaped(name) | Segment::Raw(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }
}

fn parse_tag(body: &str, triple: bool, offset: usize) -> Result<Option<Segment>, TemplateError> {
    if triple {
        if body.is_empty() {
            return Err(TemplateError::EmptyTag { offset });
        }
        return Ok(Some(Segment::Raw(body.to_string())));
    }

    let mut chars = body.chars();
    match chars.next() {
        None => Err(TemplateError::EmptyTag { offset }),
        Some('!') => Ok(None),
        Some('&') => {
            let name = chars.as_str().trim();
            if name.is_empty() {
                return Err(TemplateError::EmptyTag { offset });
            }
            Ok(Some(Segment::Raw(name.to_string())))
        }
        Some('#' | '^' | '/' | '>' | '<' | '=' | '$') => Err(TemplateError::Unsupported {
            tag: body.to_string(),
            offset,
        }),
        Some(_) => Ok(Some(Segment::Escaped(body.to_string()))),
    }
}

impl Renderer for Template {
    fn render(&self, payload: &Map<String, Value>) -> Result<String, RenderError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Escaped(name) => {
                    let value = lookup(payload, name)?;
                    escape_html_into(&stringify(value), &mut out);
                }
                Segment::Raw(name) => out.push_str(&stringify(lookup(payload, name)?)),
            }
        }
        Ok(out)
    }
}

fn lookup<'a>(payload: &'a Map<String, Value>, name: &str) -> Result<&'a Value, RenderError> {
    payload
        .get(name)
        .ok_or_else(|| RenderError::MissingVariable(name.to_string()))
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_html_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '/' => out.push_str("&#x2F;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            c => out.push(c),
        }
    }
}
