//! Typed access to the flat argument map of a request.
//!
//! Arguments are scalars. Integers arrive as JSON numbers or numeric
//! strings; both are accepted. A `null` counts as absent.

use serde_json::{Map, Value};

use ferreteria_core::ItemDraft;

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Default)]
pub struct Args(Map<String, Value>);

impl Args {
    pub fn new(map: Map<String, Value>) -> Self {
        Args(map)
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn opt_i64(&self, name: &str) -> ServiceResult<Option<i64>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| invalid(name, "an integer")),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| invalid(name, "an integer")),
            Some(_) => Err(invalid(name, "an integer")),
        }
    }

    pub fn i64(&self, name: &str) -> ServiceResult<i64> {
        self.opt_i64(name)?.ok_or_else(|| missing(name))
    }

    pub fn opt_str(&self, name: &str) -> ServiceResult<Option<String>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(invalid(name, "a string")),
        }
    }

    pub fn str(&self, name: &str) -> ServiceResult<String> {
        self.opt_str(name)?.ok_or_else(|| missing(name))
    }

    /// Item fields as a draft. Field rules are the validator's job; this
    /// only rejects values of the wrong type.
    pub fn item_draft(&self) -> ServiceResult<ItemDraft> {
        // numeric strings for integer fields, as everywhere else
        let mut map = self.0.clone();
        for field in ["id", "categoryId", "supplierId", "currentStock", "minStock"] {
            if let Some(value) = self.opt_i64(field)? {
                map.insert(field.to_string(), Value::from(value));
            }
        }
        if let Some(Value::String(s)) = map.get("active") {
            let parsed = match s.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => return Err(invalid("active", "a boolean")),
            };
            map.insert("active".to_string(), Value::Bool(parsed));
        }

        serde_json::from_value(Value::Object(map))
            .map_err(|e| ServiceError::InvalidArgument(format!("item: {e}")))
    }
}

fn invalid(name: &str, expected: &str) -> ServiceError {
    ServiceError::InvalidArgument(format!("{name} must be {expected}"))
}

fn missing(name: &str) -> ServiceError {
    ServiceError::InvalidArgument(format!("{name} is required"))
}
