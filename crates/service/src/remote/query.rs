use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// A list filter in the platform's JSON query form:
/// `{"method":"equal","attribute":"status","values":["active"]}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Query {
    method: &'static str,
    attribute: String,
    values: Vec<Value>,
}

impl Query {
    /// Match rows whose `attribute` equals any of `values`.
    pub fn equal<V: Into<Value>>(attribute: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            method: "equal",
            attribute: attribute.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn method(&self) -> &str { self.method }

    pub fn attribute(&self) -> &str { &self.attribute }

    pub fn values(&self) -> &[Value] { &self.values }

    /// Evaluate against a decoded row. Used by the in-memory table.
    pub fn matches(&self, row: &Value) -> bool {
        match self.method {
            "equal" => row.get(&self.attribute).map_or(false, |v| self.values.contains(v)),
            _ => false,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}
