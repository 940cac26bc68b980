use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Which Bond collection an object comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectKind {
    Device,
    Group,
}

impl ObjectKind {
    /// Path segment used by the v2 API.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Device => "devices",
            Self::Group => "groups",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => write!(f, "DEVICE"),
            Self::Group => write!(f, "GROUP"),
        }
    }
}

/// Shape of the argument an action takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum ActionArgument {
    None,
    Integer,
    Enum(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub name: String,
    pub argument: ActionArgument,
}

impl Action {
    pub fn new(name: &str, meta: Option<&Value>) -> Self {
        let argument = match meta {
            Some(Value::Array(values)) if values.iter().all(Value::is_string) => {
                ActionArgument::Enum(
                    values
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                )
            }
            _ if name.starts_with("Set") => ActionArgument::Integer,
            _ => ActionArgument::None,
        };
        Self {
            name: name.to_string(),
            argument,
        }
    }
}

/// Actions as returned by the bridge; either a list of names or a map keyed by name.
#[derive(Debug, Deserialize, Default)]
#[serde(untagged)]
pub enum RawActions {
    #[default]
    Missing,
    List(Vec<String>),
    Map(Map<String, Value>),
}

impl RawActions {
    pub fn into_actions(self) -> Vec<Action> {
        match self {
            Self::Missing => Vec::new(),
            Self::List(names) => names.iter().map(|n| Action::new(n, None)).collect(),
            Self::Map(map) => map.iter().map(|(n, meta)| Action::new(n, Some(meta))).collect(),
        }
    }
}

/// `GET /v2/devices/{id}`
#[derive(Debug, Deserialize)]
pub struct DevicePayload {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub actions: RawActions,
}

/// `GET /v2/groups/{id}`
#[derive(Debug, Deserialize)]
pub struct GroupPayload {
    pub name: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub actions: RawActions,
    #[serde(default)]
    pub devices: Vec<String>,
}

/// `GET /v2/sys/version`
#[derive(Debug, Deserialize, Default)]
pub struct SysVersion {
    pub bondid: Option<String>,
    pub fw_ver: Option<String>,
}

/// Resolved type of a group, based on the types of its members.
#[derive(Debug, PartialEq, Eq)]
pub enum GroupType {
    Single(String),
    Empty,
    Mixed(Vec<String>),
}

impl GroupType {
    pub fn resolve(types: &[String]) -> Self {
        let mut unique: Vec<String> = types.to_vec();
        unique.sort();
        unique.dedup();
        match unique.len() {
            0 => Self::Empty,
            1 => Self::Single(unique.remove(0)),
            _ => Self::Mixed(unique),
        }
    }
}

/// One device or group, snapshotted once per run.
#[derive(Debug, Clone, Serialize)]
pub struct BondObject {
    pub kind: ObjectKind,
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub location: String,
    pub actions: Vec<Action>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    pub state: BTreeMap<String, Value>,
    pub properties: BTreeMap<String, Value>,
}

impl BondObject {
    pub fn from_device(id: &str, payload: DevicePayload) -> Self {
        Self {
            kind: ObjectKind::Device,
            id: id.to_string(),
            name: payload.name.unwrap_or_else(|| "(unnamed)".into()),
            object_type: payload.device_type.unwrap_or_else(|| "(unknown)".into()),
            location: payload.location.unwrap_or_else(|| "-".into()),
            actions: payload.actions.into_actions(),
            members: Vec::new(),
            state: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    /// None when the group mixes device types, which we can't map.
    pub fn from_group(id: &str, payload: GroupPayload) -> Option<Self> {
        let object_type = match GroupType::resolve(&payload.types) {
            GroupType::Single(t) => t,
            GroupType::Empty => "group".to_string(),
            GroupType::Mixed(_) => return None,
        };
        Some(Self {
            kind: ObjectKind::Group,
            id: id.to_string(),
            name: payload.name.unwrap_or_else(|| "(unnamed group)".into()),
            object_type,
            location: payload.location.unwrap_or_else(|| "-".into()),
            actions: payload.actions.into_actions(),
            members: payload.devices,
            state: BTreeMap::new(),
            properties: BTreeMap::new(),
        })
    }

    pub fn property_f64(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }

    /// Groups first, then location, name and id.
    pub fn sort_key(&self) -> (u8, String, String, String) {
        let rank = match self.kind {
            ObjectKind::Group => 0,
            ObjectKind::Device => 1,
        };
        (
            rank,
            self.location.to_lowercase(),
            self.name.to_lowercase(),
            self.id.clone(),
        )
    }
}

/// Index keys that are object ids: at least 8 hex digits.
pub fn looks_like_id(key: &str) -> bool {
    key.len() >= 8 && key.chars().all(|c| c.is_ascii_hexdigit())
}
