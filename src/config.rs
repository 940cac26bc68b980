use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Loxone signal kind of a virtual output/input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Digital,
    Analog,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

/// The `loxone` part of a rule: what the matched action or state becomes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    #[serde(rename = "type")]
    pub signal: Option<SignalType>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub range: Option<Range>,
    #[serde(default)]
    pub invert: bool,
    /// Take the range from device properties (eg. `max_speed`).
    #[serde(default)]
    pub query_device_range: bool,
    pub poll_interval: Option<u32>,
    #[serde(default)]
    pub ignore: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionMatch {
    pub device_type: Option<String>,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateMatch {
    pub device_type: Option<String>,
    pub state_key: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverrideMatch {
    pub device_id: String,
    pub action: Option<String>,
    pub state_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule<M> {
    #[serde(rename = "match")]
    pub matcher: M,
    #[serde(default)]
    pub loxone: Target,
    #[serde(default)]
    pub ignore: bool,
}

pub type ActionRule = Rule<ActionMatch>;
pub type StateRule = Rule<StateMatch>;
pub type OverrideRule = Rule<OverrideMatch>;

impl<M> Rule<M> {
    pub fn is_ignored(&self) -> bool {
        self.ignore || self.loxone.ignore
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSettings {
    pub poll_interval: Option<u32>,
}

/// User mapping file. Entries extend the built-in table; later entries win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingConfig {
    pub mappings: Vec<ActionRule>,
    pub state_mappings: Vec<StateRule>,
    pub overrides: Vec<OverrideRule>,
    pub global_settings: GlobalSettings,
}

const TOP_LEVEL_KEYS: [&str; 4] = ["mappings", "state_mappings", "overrides", "global_settings"];

fn parse_entries<T: DeserializeOwned>(root: &Value, key: &str) -> Result<Vec<T>> {
    let entries = match root.get(key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(Error::invalid_config(key, "expected a list")),
    };
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            serde_json::from_value(entry.clone())
                .map_err(|e| Error::invalid_config(format!("{}[{}]", key, idx), e.to_string()))
        })
        .collect()
}

fn check_pattern(key: String, pattern: &str) -> Result<()> {
    if pattern.trim().is_empty() {
        return Err(Error::invalid_config(key, "must not be empty"));
    }
    Ok(())
}

fn check_target(key: String, target: &Target) -> Result<()> {
    if let Some(range) = target.range {
        if range.min >= range.max {
            return Err(Error::invalid_config(
                format!("{}.range", key),
                format!("min ({}) must be below max ({})", range.min, range.max),
            ));
        }
    }
    if target.poll_interval == Some(0) {
        return Err(Error::invalid_config(
            format!("{}.poll_interval", key),
            "must be positive",
        ));
    }
    Ok(())
}

impl MappingConfig {
    /// Load from a JSON file, or YAML when the extension says so.
    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let path = filename.as_ref();
        let read_err = |source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        };
        let handle = File::open(path).map_err(read_err)?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let root: Value = if is_yaml {
            serde_yaml::from_reader(handle).map_err(|e| Error::invalid_config("$", e.to_string()))?
        } else {
            serde_json::from_reader(handle).map_err(|e| Error::invalid_config("$", e.to_string()))?
        };

        let config = Self::from_value(&root)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Missing path means built-ins only.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_value(root: &Value) -> Result<Self> {
        let object = root
            .as_object()
            .ok_or_else(|| Error::invalid_config("$", "expected an object"))?;
        if let Some(unknown) = object
            .keys()
            .find(|k| !TOP_LEVEL_KEYS.contains(&k.as_str()))
        {
            return Err(Error::invalid_config(unknown.as_str(), "unknown key"));
        }

        let global_settings = match root.get("global_settings") {
            None | Some(Value::Null) => GlobalSettings::default(),
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| Error::invalid_config("global_settings", e.to_string()))?,
        };

        let config = Self {
            mappings: parse_entries(root, "mappings")?,
            state_mappings: parse_entries(root, "state_mappings")?,
            overrides: parse_entries(root, "overrides")?,
            global_settings,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (idx, rule) in self.mappings.iter().enumerate() {
            let key = format!("mappings[{}]", idx);
            check_pattern(format!("{}.match.action", key), &rule.matcher.action)?;
            check_target(format!("{}.loxone", key), &rule.loxone)?;
        }
        for (idx, rule) in self.state_mappings.iter().enumerate() {
            let key = format!("state_mappings[{}]", idx);
            check_pattern(format!("{}.match.state_key", key), &rule.matcher.state_key)?;
            check_target(format!("{}.loxone", key), &rule.loxone)?;
        }
        for (idx, rule) in self.overrides.iter().enumerate() {
            let key = format!("overrides[{}]", idx);
            check_pattern(format!("{}.match.device_id", key), &rule.matcher.device_id)?;
            match (&rule.matcher.action, &rule.matcher.state_key) {
                (Some(action), None) => check_pattern(format!("{}.match.action", key), action)?,
                (None, Some(state)) => check_pattern(format!("{}.match.state_key", key), state)?,
                _ => {
                    return Err(Error::invalid_config(
                        format!("{}.match", key),
                        "exactly one of `action` or `state_key` is required",
                    ))
                }
            }
            check_target(format!("{}.loxone", key), &rule.loxone)?;
        }
        if self.global_settings.poll_interval == Some(0) {
            return Err(Error::invalid_config(
                "global_settings.poll_interval",
                "must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn invalid_key(root: Value) -> String {
        match MappingConfig::from_value(&root) {
            Err(Error::InvalidConfig { key, .. }) => key,
            other => panic!("expected invalid config, got {:?}", other),
        }
    }

    #[test]
    fn parses_full_config() {
        let config = MappingConfig::from_value(&json!({
            "mappings": [
                {"match": {"device_type": "CF", "action": "SetSpeed"},
                 "loxone": {"type": "analog", "range": {"min": 1, "max": 6}}}
            ],
            "state_mappings": [
                {"match": {"state_key": "timer"}, "ignore": true}
            ],
            "overrides": [
                {"match": {"device_id": "aabbccdd", "action": "Stop"},
                 "loxone": {"type": "digital", "description": "Halt"}}
            ],
            "global_settings": {"poll_interval": 10}
        }))
        .unwrap();

        assert_eq!(config.mappings.len(), 1);
        assert_eq!(config.mappings[0].loxone.signal, Some(SignalType::Analog));
        assert!(config.state_mappings[0].is_ignored());
        assert_eq!(config.overrides[0].matcher.action.as_deref(), Some("Stop"));
        assert_eq!(config.global_settings.poll_interval, Some(10));
    }

    #[test]
    fn reports_offending_key() {
        assert_eq!(invalid_key(json!({"mapings": []})), "mapings");
        assert_eq!(
            invalid_key(json!({"mappings": [{"match": {"action": "Open"}}, {"match": {}}]})),
            "mappings[1]"
        );
        assert_eq!(
            invalid_key(json!({"mappings": [{"match": {"action": ""}}]})),
            "mappings[0].match.action"
        );
        assert_eq!(
            invalid_key(json!({"overrides": [{"match": {"device_id": "aabbccdd"}}]})),
            "overrides[0].match"
        );
        assert_eq!(
            invalid_key(json!({"mappings": [{"match": {"action": "Dim"},
                "loxone": {"type": "analog", "range": {"min": 5, "max": 1}}}]})),
            "mappings[0].loxone.range"
        );
        assert_eq!(
            invalid_key(json!({"state_mappings": [{"match": {"state_key": "x"},
                "loxone": {"type": "lamp"}}]})),
            "state_mappings[0]"
        );
        assert_eq!(invalid_key(json!({"overrides": {}})), "overrides");
        assert_eq!(invalid_key(json!([])), "$");
    }

    #[test]
    fn missing_path_is_empty_config() {
        assert_eq!(MappingConfig::load(None).unwrap(), MappingConfig::default());
    }

    #[test]
    fn loads_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "mappings:\n  - match:\n      action: Toggle\n    loxone:\n      type: digital\n"
        )
        .unwrap();

        let config = MappingConfig::from_file(file.path()).unwrap();
        assert_eq!(config.mappings[0].matcher.action, "Toggle");
    }

    #[test]
    fn unreadable_and_malformed_files() {
        let missing = MappingConfig::from_file("/nonexistent/mapping.json");
        assert!(matches!(missing, Err(Error::ConfigRead { .. })));

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{ not json").unwrap();
        let broken = MappingConfig::from_file(file.path());
        assert!(matches!(broken, Err(Error::InvalidConfig { key, .. }) if key == "$"));
    }
}
