//! Export configuration as handed over by the caller.
//!
//! Accepted either as a procedure-style parameter map or as JSON:
//!
//! ```json
//! { "sampling": true, "samplingConfig": { "sample": 100 }, "caption": ["name"] }
//! ```

use serde::Deserialize;

use crate::model::{PropertyMap, Value};
use crate::{Error, Result};

/// Caption keys tried, in order, when rendering Gephi node captions.
pub const DEFAULT_CAPTION: [&str; 3] = ["name", "title", "label"];

/// Configuration mapping forwarded verbatim to the schema-sampling procedures.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "serde_json::Map<String, serde_json::Value>")]
pub struct SamplingConfig(PropertyMap);

impl SamplingConfig {
    pub fn new(entries: PropertyMap) -> Self {
        Self(entries)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Insert `value()` under `key` only when the caller did not supply one.
    /// Returns true when the value was injected.
    pub fn put_if_absent(&mut self, key: &str, value: impl FnOnce() -> Value) -> bool {
        if self.0.contains_key(key) {
            return false;
        }
        self.0.insert(key.to_owned(), value());
        true
    }

    pub fn entries(&self) -> &PropertyMap {
        &self.0
    }

    /// The config as the single map argument of a procedure call.
    pub fn to_value(&self) -> Value {
        Value::Map(self.0.clone())
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for SamplingConfig {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map.into_iter().map(|(k, v)| (k, json_to_value(v))).collect())
    }
}

/// Options that steer type collection and formatting for one export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    /// Delegate type inference to the schema-sampling procedures.
    pub sampling: bool,
    pub sampling_config: SamplingConfig,
    pub caption: Vec<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sampling: false,
            sampling_config: SamplingConfig::default(),
            caption: DEFAULT_CAPTION.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ExportConfig {
    pub fn sampled(sampling_config: SamplingConfig) -> Self {
        Self { sampling: true, sampling_config, ..Self::default() }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("invalid export config: {e}")))
    }

    /// Read the config from a procedure parameter map. Unknown keys are ignored.
    pub fn from_params(params: &PropertyMap) -> Result<Self> {
        let mut config = Self::default();

        match params.get("sampling") {
            None | Some(Value::Null) => {}
            Some(Value::Bool(b)) => config.sampling = *b,
            Some(other) => return Err(bad_param("sampling", "BOOLEAN", other)),
        }

        match params.get("samplingConfig") {
            None | Some(Value::Null) => {}
            Some(Value::Map(m)) => config.sampling_config = SamplingConfig(m.clone()),
            Some(other) => return Err(bad_param("samplingConfig", "MAP", other)),
        }

        match params.get("caption") {
            None | Some(Value::Null) => {}
            Some(Value::List(items)) => {
                config.caption = items.iter()
                    .map(|item| {
                        item.as_str()
                            .map(str::to_owned)
                            .ok_or_else(|| bad_param("caption", "LIST OF STRING", item))
                    })
                    .collect::<Result<_>>()?;
            }
            Some(other) => return Err(bad_param("caption", "LIST OF STRING", other)),
        }

        Ok(config)
    }
}

fn bad_param(key: &str, expected: &str, got: &Value) -> Error {
    Error::ConfigError(format!("{key} must be {expected}, got {}", got.type_name()))
}

fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::List(items.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => {
            Value::Map(map.into_iter().map(|(k, v)| (k, json_to_value(v))).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert!(!config.sampling);
        assert_eq!(config.caption, vec!["name", "title", "label"]);
        assert!(config.sampling_config.entries().is_empty());
    }

    #[test]
    fn test_from_json() {
        let config = ExportConfig::from_json(
            r#"{"sampling": true, "samplingConfig": {"sample": 10, "includeLabels": ["Person"]}}"#,
        ).unwrap();
        assert!(config.sampling);
        assert_eq!(config.sampling_config.get("sample"), Some(&Value::Int(10)));
        assert_eq!(
            config.sampling_config.get("includeLabels"),
            Some(&Value::from(vec!["Person"]))
        );
        assert_eq!(config.caption.len(), 3);
    }

    #[test]
    fn test_from_json_rejects_bad_shape() {
        let err = ExportConfig::from_json(r#"{"sampling": "yes"}"#).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_from_params() {
        let mut sampling_config = PropertyMap::new();
        sampling_config.insert("sample".into(), Value::Int(5));

        let mut params = PropertyMap::new();
        params.insert("sampling".into(), Value::Bool(true));
        params.insert("samplingConfig".into(), Value::Map(sampling_config));
        params.insert("caption".into(), Value::from(vec!["title"]));

        let config = ExportConfig::from_params(&params).unwrap();
        assert!(config.sampling);
        assert_eq!(config.sampling_config.get("sample"), Some(&Value::Int(5)));
        assert_eq!(config.caption, vec!["title"]);
    }

    #[test]
    fn test_from_params_rejects_bad_types() {
        let mut params = PropertyMap::new();
        params.insert("samplingConfig".into(), Value::Int(1));
        assert!(matches!(ExportConfig::from_params(&params), Err(Error::ConfigError(_))));

        let mut params = PropertyMap::new();
        params.insert("caption".into(), Value::from(vec![1i64]));
        assert!(matches!(ExportConfig::from_params(&params), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_put_if_absent() {
        let mut conf = SamplingConfig::default();
        assert!(conf.put_if_absent("includeLabels", || Value::from(vec!["A"])));
        assert!(!conf.put_if_absent("includeLabels", || Value::from(vec!["B"])));
        assert_eq!(conf.get("includeLabels"), Some(&Value::from(vec!["A"])));
    }
}
