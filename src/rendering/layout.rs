//! Layout documents and the interpreter that paints them.
//!
//! A document is an ordered widget list plus a bag of named values. Widgets
//! are painted in list order (later widgets cover earlier ones) at absolute,
//! author-specified positions; there is no flow or negotiation.

use std::collections::HashMap;
use std::fmt;

use log::trace;
use serde::Deserialize;

use crate::rendering::paint::{Point, Size, Surface, TextStyle};
use crate::rendering::widgets;
use crate::{Error, Result};

/// A named value a widget can display.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Boolean(_) => ValueKind::Boolean,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
        })
    }
}

/// A text label. `origin` is the left end of the baseline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextSpec {
    pub origin: Point,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub center: bool,
    #[serde(default)]
    pub invert: bool,
    #[serde(rename = "value")]
    pub value_key: String,
}

/// A horizontal capacity gauge. `origin` is the top-left of the track.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressBarSpec {
    pub origin: Point,
    #[serde(default)]
    pub size: Size,
    #[serde(rename = "value")]
    pub value_key: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WidgetSpec {
    Text(TextSpec),
    ProgressBar(ProgressBarSpec),
}

impl WidgetSpec {
    pub fn value_key(&self) -> &str {
        match self {
            WidgetSpec::Text(spec) => &spec.value_key,
            WidgetSpec::ProgressBar(spec) => &spec.value_key,
        }
    }
}

/// One render request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LayoutDocument {
    #[serde(rename = "layout")]
    pub widgets: Vec<WidgetSpec>,
    #[serde(default)]
    pub values: HashMap<String, Value>,
}

/// A widget paired with the value it displays.
enum Resolved<'a> {
    Text(&'a TextSpec, &'a str),
    ProgressBar(&'a ProgressBarSpec, f64),
}

impl LayoutDocument {
    /// Decode a request payload (UTF-8 JSON).
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn lookup(&self, key: &str, expected: ValueKind) -> Result<&Value> {
        self.values.get(key).ok_or_else(|| Error::UnresolvedValue {
            key: key.to_string(),
            expected,
        })
    }

    /// Resolve `key` to a string value.
    pub fn resolve_string(&self, key: &str) -> Result<&str> {
        match self.lookup(key, ValueKind::String)? {
            Value::String(s) => Ok(s),
            other => Err(Error::ValueTypeMismatch {
                key: key.to_string(),
                expected: ValueKind::String,
                found: other.kind(),
            }),
        }
    }

    /// Resolve `key` to a numeric value.
    pub fn resolve_number(&self, key: &str) -> Result<f64> {
        match self.lookup(key, ValueKind::Number)? {
            Value::Number(n) => Ok(*n),
            other => Err(Error::ValueTypeMismatch {
                key: key.to_string(),
                expected: ValueKind::Number,
                found: other.kind(),
            }),
        }
    }

    fn resolve_widget<'a>(&'a self, widget: &'a WidgetSpec) -> Result<Resolved<'a>> {
        Ok(match widget {
            WidgetSpec::Text(spec) => Resolved::Text(spec, self.resolve_string(&spec.value_key)?),
            WidgetSpec::ProgressBar(spec) => {
                Resolved::ProgressBar(spec, self.resolve_number(&spec.value_key)?)
            }
        })
    }

    /// Paint every widget onto `surface`, in order.
    ///
    /// All value references are resolved before anything is painted, so a
    /// bad reference leaves the surface untouched.
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S, style: &TextStyle) -> Result<()> {
        let resolved = self
            .widgets
            .iter()
            .map(|widget| self.resolve_widget(widget))
            .collect::<Result<Vec<_>>>()?;
        for (index, widget) in resolved.into_iter().enumerate() {
            match widget {
                Resolved::Text(spec, text) => {
                    trace!("widget {index}: {spec:?} = '{text}'");
                    widgets::draw_text(surface, style, spec, text);
                }
                Resolved::ProgressBar(spec, progress) => {
                    trace!("widget {index}: {spec:?} = {progress}");
                    widgets::draw_progress_bar(surface, spec, progress as f32);
                }
            }
        }
        Ok(())
    }
}
