use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    foundation::error::{PixformError, PixformResult},
    params::{
        document::ParamDocument,
        schema::{Schema, json_type},
    },
};

/// Field name reported when the document root itself is wrong.
pub const ROOT_FIELD: &str = "$";

/// Canonical, schema-validated parameters: every schema field present, defaults filled in,
/// nothing else.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundParams {
    values: Map<String, Value>,
}

impl BoundParams {
    /// Value of a bound field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// All bound fields.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Compact JSON form handed to dynamic plugins.
    pub fn to_json_string(&self) -> String {
        Value::Object(self.values.clone()).to_string()
    }

    /// Decode into a transform's typed configuration.
    ///
    /// The binder already checked types and ranges, so a failure here means the transform's
    /// schema and its config type disagree.
    pub fn decode<T: DeserializeOwned>(&self) -> PixformResult<T> {
        serde_json::from_value(Value::Object(self.values.clone())).map_err(|e| {
            PixformError::config(format!(
                "bound parameters do not match {}: {e}",
                std::any::type_name::<T>()
            ))
        })
    }
}

/// Bind a parameter document against a schema.
///
/// Fails on the first violation, in this order: non-object root, unknown keys (map order),
/// then schema fields in declaration order (missing, type, range).
pub fn bind(doc: &ParamDocument, schema: &Schema) -> PixformResult<BoundParams> {
    let Value::Object(obj) = doc.value() else {
        return Err(PixformError::schema(
            ROOT_FIELD,
            format!("expected a JSON object, got {}", json_type(doc.value())),
        ));
    };

    if let Some(unknown) = obj.keys().find(|k| schema.get(k).is_none()) {
        let known: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        return Err(PixformError::schema(
            unknown.as_str(),
            format!("unknown field, expected one of [{}]", known.join(", ")),
        ));
    }

    let mut values = Map::new();
    for field in &schema.fields {
        match obj.get(&field.name) {
            Some(v) => {
                field
                    .check(v)
                    .map_err(|reason| PixformError::schema(field.name.as_str(), reason))?;
                values.insert(field.name.clone(), v.clone());
            }
            None if field.required => {
                return Err(PixformError::schema(
                    field.name.as_str(),
                    "missing required field",
                ));
            }
            None => {
                if let Some(default) = &field.default {
                    values.insert(field.name.clone(), default.clone());
                }
            }
        }
    }

    tracing::debug!(fields = values.len(), "parameters bound");
    Ok(BoundParams { values })
}

#[cfg(test)]
#[path = "../../tests/unit/params/bind.rs"]
mod tests;
