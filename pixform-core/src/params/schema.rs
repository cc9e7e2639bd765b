//! Declarative parameter schemas.
//!
//! Every transform publishes a [`Schema`]. Built-ins construct theirs with the builder methods on
//! [`FieldSpec`]; dynamic plugins ship the same structure serialized as JSON across the ABI.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered list of fields a transform accepts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Field specs, checked in this order by the binder.
    pub fields: Vec<FieldSpec>,
}

/// One named field with its type, range and default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// JSON key.
    pub name: String,
    /// Human-readable summary.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Whether the document must provide the field.
    #[serde(default = "required_by_default")]
    pub required: bool,
    /// Value inserted when an optional field is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Type and valid range.
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Value domain of a field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// JSON integer within `[min, max]`.
    Integer {
        /// Inclusive lower bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        /// Inclusive upper bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    /// JSON number (integers accepted) within the given bounds.
    Number {
        /// Lower bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        /// Whether `min` itself is excluded.
        #[serde(default)]
        min_exclusive: bool,
        /// Inclusive upper bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// JSON `true` / `false`.
    Boolean,
    /// JSON string drawn from a fixed set.
    Enum {
        /// Accepted spellings.
        values: Vec<String>,
    },
}

fn required_by_default() -> bool {
    true
}

impl Schema {
    /// Empty schema; a transform with no parameters accepts only `{}`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Parse the JSON descriptor form and check it for internal consistency.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let schema: Schema =
            serde_json::from_str(json).map_err(|e| format!("malformed schema descriptor: {e}"))?;
        schema.validate()?;
        Ok(schema)
    }

    /// Serialize to the JSON descriptor form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Reject duplicate names, empty enums, inverted ranges and defaults outside their domain.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for f in &self.fields {
            if f.name.is_empty() {
                return Err("field name must be non-empty".to_string());
            }
            if !seen.insert(f.name.as_str()) {
                return Err(format!("duplicate field '{}'", f.name));
            }
            match &f.kind {
                FieldKind::Integer {
                    min: Some(lo),
                    max: Some(hi),
                } if lo > hi => {
                    return Err(format!("field '{}' has min {lo} > max {hi}", f.name));
                }
                FieldKind::Number { min, max, .. } => {
                    if min.is_some_and(|v| !v.is_finite()) || max.is_some_and(|v| !v.is_finite()) {
                        return Err(format!("field '{}' has a non-finite bound", f.name));
                    }
                    if let (Some(lo), Some(hi)) = (min, max) {
                        if lo > hi {
                            return Err(format!("field '{}' has min {lo} > max {hi}", f.name));
                        }
                    }
                }
                FieldKind::Enum { values } if values.is_empty() => {
                    return Err(format!("enum field '{}' lists no values", f.name));
                }
                _ => {}
            }
            if let Some(default) = &f.default {
                f.check(default)
                    .map_err(|reason| format!("default of '{}' {reason}", f.name))?;
            }
        }
        Ok(())
    }
}

impl FieldSpec {
    fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            required: true,
            default: None,
            kind,
        }
    }

    /// Required integer field without bounds.
    pub fn integer(name: &str) -> Self {
        Self::new(
            name,
            FieldKind::Integer {
                min: None,
                max: None,
            },
        )
    }

    /// Required number field without bounds.
    pub fn number(name: &str) -> Self {
        Self::new(
            name,
            FieldKind::Number {
                min: None,
                min_exclusive: false,
                max: None,
            },
        )
    }

    /// Required boolean field.
    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// Required string field restricted to `values`.
    pub fn one_of(name: &str, values: &[&str]) -> Self {
        Self::new(
            name,
            FieldKind::Enum {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        )
    }

    /// Inclusive integer range.
    pub fn range(mut self, lo: i64, hi: i64) -> Self {
        if let FieldKind::Integer { min, max } = &mut self.kind {
            *min = Some(lo);
            *max = Some(hi);
        }
        self
    }

    /// Exclusive lower bound for number fields.
    pub fn greater_than(mut self, lo: f64) -> Self {
        if let FieldKind::Number {
            min, min_exclusive, ..
        } = &mut self.kind
        {
            *min = Some(lo);
            *min_exclusive = true;
        }
        self
    }

    /// Inclusive upper bound for number fields.
    pub fn at_most(mut self, hi: f64) -> Self {
        if let FieldKind::Number { max, .. } = &mut self.kind {
            *max = Some(hi);
        }
        self
    }

    /// Make the field optional with a default.
    pub fn optional(mut self, default: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(default.into());
        self
    }

    /// Attach a description.
    pub fn describe(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }

    /// Strict type and range check. Returns a reason suitable for `ParamSchema`.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match &self.kind {
            FieldKind::Integer { min, max } => {
                let Some(n) = value.as_number() else {
                    return Err(format!("expected an integer, got {}", json_type(value)));
                };
                if n.is_f64() {
                    return Err(format!("expected an integer, got {n}"));
                }
                let Some(v) = n.as_i64() else {
                    return Err(format!("{n} is out of range"));
                };
                if min.is_some_and(|lo| v < lo) {
                    return Err(format!("must be >= {}, got {v}", min.unwrap_or_default()));
                }
                if max.is_some_and(|hi| v > hi) {
                    return Err(format!("must be <= {}, got {v}", max.unwrap_or_default()));
                }
                Ok(())
            }
            FieldKind::Number {
                min,
                min_exclusive,
                max,
            } => {
                let Some(v) = value.as_f64() else {
                    return Err(format!("expected a number, got {}", json_type(value)));
                };
                if let Some(lo) = min {
                    if *min_exclusive && v <= *lo {
                        return Err(format!("must be > {lo}, got {v}"));
                    }
                    if !*min_exclusive && v < *lo {
                        return Err(format!("must be >= {lo}, got {v}"));
                    }
                }
                if let Some(hi) = max {
                    if v > *hi {
                        return Err(format!("must be <= {hi}, got {v}"));
                    }
                }
                Ok(())
            }
            FieldKind::Boolean => match value {
                Value::Bool(_) => Ok(()),
                other => Err(format!("expected a boolean, got {}", json_type(other))),
            },
            FieldKind::Enum { values } => {
                let Some(s) = value.as_str() else {
                    return Err(format!("expected a string, got {}", json_type(value)));
                };
                if values.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(format!("must be one of [{}], got \"{s}\"", values.join(", ")))
                }
            }
        }
    }
}

pub(crate) fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/params/schema.rs"]
mod tests;
