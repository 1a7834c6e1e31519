use crate::error::ToolError;
use serde_json::{Map, Value};

/// Typed reads over a raw options object with the schema rules shared by all engines:
/// absent or `null` fields take their default, coerced numbers accept numeric strings,
/// bounds are inclusive.
pub struct OptionsReader<'a> {
    tool: &'static str,
    map: &'a Map<String, Value>,
}

impl<'a> OptionsReader<'a> {
    pub fn new(tool: &'static str, raw: &'a Value) -> Result<Self, ToolError> {
        match raw {
            Value::Object(map) => Ok(Self { tool, map }),
            _ => Err(ToolError::invalid(tool, "options must be a JSON object")),
        }
    }

    fn field(&self, key: &str) -> Option<&'a Value> {
        match self.map.get(key) {
            None | Some(Value::Null) => None,
            Some(v) => Some(v),
        }
    }

    fn invalid(&self, message: String) -> ToolError {
        ToolError::invalid(self.tool, message)
    }

    fn coerce_number(&self, key: &str, v: &Value) -> Result<f64, ToolError> {
        let parsed = match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if n.is_finite() => Ok(n),
            _ => Err(self.invalid(format!("{key}: expected a number"))),
        }
    }

    fn check_bounds(&self, key: &str, n: f64, min: Option<f64>, max: Option<f64>) -> Result<f64, ToolError> {
        if let Some(min) = min {
            if n < min {
                return Err(self.invalid(format!("{key}: must be at least {min}")));
            }
        }
        if let Some(max) = max {
            if n > max {
                return Err(self.invalid(format!("{key}: must be at most {max}")));
            }
        }
        Ok(n)
    }

    /// Coerced number with a default.
    pub fn number(&self, key: &str, default: f64, min: Option<f64>, max: Option<f64>) -> Result<f64, ToolError> {
        match self.field(key) {
            None => Ok(default),
            Some(v) => {
                let n = self.coerce_number(key, v)?;
                self.check_bounds(key, n, min, max)
            }
        }
    }

    /// Coerced number without a default.
    pub fn required_number(&self, key: &str, min: Option<f64>, max: Option<f64>) -> Result<f64, ToolError> {
        match self.field(key) {
            None => Err(self.invalid(format!("{key}: required"))),
            Some(v) => {
                let n = self.coerce_number(key, v)?;
                self.check_bounds(key, n, min, max)
            }
        }
    }

    /// Strict integer: JSON integers only, no string coercion.
    pub fn integer(&self, key: &str, default: i64, min: i64, max: i64) -> Result<i64, ToolError> {
        let Some(v) = self.field(key) else {
            return Ok(default);
        };
        let n = match v {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            _ => None,
        }
        .ok_or_else(|| self.invalid(format!("{key}: expected an integer")))?;
        if n < min || n > max {
            return Err(self.invalid(format!("{key}: must be between {min} and {max}")));
        }
        Ok(n)
    }

    pub fn string(&self, key: &str, default: &str) -> Result<String, ToolError> {
        Ok(self.optional_string(key)?.unwrap_or_else(|| default.to_string()))
    }

    pub fn optional_string(&self, key: &str) -> Result<Option<String>, ToolError> {
        match self.field(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.invalid(format!("{key}: expected a string"))),
        }
    }

    pub fn required_string(&self, key: &str) -> Result<String, ToolError> {
        self.optional_string(key)?
            .ok_or_else(|| self.invalid(format!("{key}: required")))
    }

    /// String restricted to `allowed`, returned as the matching static value.
    pub fn one_of(&self, key: &str, allowed: &[&'static str], default: &'static str) -> Result<&'static str, ToolError> {
        let Some(raw) = self.optional_string(key)? else {
            return Ok(default);
        };
        allowed
            .iter()
            .copied()
            .find(|a| *a == raw)
            .ok_or_else(|| self.invalid(format!("{key}: expected one of {}", allowed.join(", "))))
    }
}
