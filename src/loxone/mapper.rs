use super::builtin;
use crate::bond::{BondObject, ObjectKind};
use crate::config::{ActionRule, MappingConfig, OverrideRule, Rule, SignalType, StateRule, Target};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

const DEFAULT_MIN: f64 = 0.0;
const DEFAULT_MAX: f64 = 100.0;

/// Test variant generated for an action we have no mapping for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewVariant {
    Digital,
    Analog,
}

/// Command sink: one Loxone virtual output command per Bond action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualOutput {
    pub kind: ObjectKind,
    pub object_id: String,
    pub object_name: String,
    pub location: String,
    /// Action name as known by Bond.
    pub action: String,
    /// Command title suffix in Loxone.
    pub command: String,
    #[serde(rename = "type")]
    pub signal: SignalType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub min: f64,
    pub max: f64,
    pub invert: bool,
    /// Set when the output is a guess that needs manual review.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewVariant>,
}

/// State source: one Loxone virtual HTTP input command per state key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualInput {
    pub kind: ObjectKind,
    pub object_id: String,
    pub object_name: String,
    pub location: String,
    pub state_key: String,
    #[serde(rename = "type")]
    pub signal: SignalType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub poll_interval: u32,
}

#[derive(Debug, Default)]
pub struct MappedObject {
    pub outputs: Vec<VirtualOutput>,
    pub inputs: Vec<VirtualInput>,
    /// Actions that fell back to review outputs.
    pub unknown_actions: Vec<String>,
}

enum Resolved<'a> {
    Ignore,
    Use(&'a Target),
}

fn resolve<M>(rule: &Rule<M>) -> Resolved<'_> {
    if rule.is_ignored() {
        Resolved::Ignore
    } else {
        Resolved::Use(&rule.loxone)
    }
}

/// Glob match where `*` stands for any run of characters.
pub fn pattern_matches(pattern: &str, value: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == value;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, last) = (parts[0], parts[parts.len() - 1]);
    if value.len() < first.len() + last.len() || !value.starts_with(first) || !value.ends_with(last)
    {
        return false;
    }
    let mut rest = &value[first.len()..value.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    true
}

fn type_matches(pattern: Option<&str>, object_type: &str) -> bool {
    pattern.map_or(true, |p| pattern_matches(p, object_type))
}

/// Bond action name to Loxone command name. Mixed-case names are kept,
/// `snake_case` and friends become `TitleCase`.
pub fn canonical_name(action: &str) -> String {
    let s = action.trim();
    if s.chars().any(|c| c.is_uppercase()) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    for part in s.split(|c: char| !c.is_ascii_alphanumeric()).filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    if out.is_empty() {
        s.to_string()
    } else {
        out
    }
}

/// Type guess for state keys without a mapping.
fn infer_signal(value: &Value) -> SignalType {
    match value {
        Value::Bool(_) => SignalType::Digital,
        Value::Number(_) => SignalType::Analog,
        _ => SignalType::Text,
    }
}

pub struct Mapper {
    overrides: Vec<OverrideRule>,
    actions: Vec<ActionRule>,
    states: Vec<StateRule>,
    poll_interval: u32,
}

impl Mapper {
    /// Built-in rules come first so user entries, searched later-first, win.
    pub fn new(config: &MappingConfig, poll_interval: u32) -> Self {
        let mut actions = builtin::action_rules();
        actions.extend(config.mappings.iter().cloned());
        let mut states = builtin::state_rules();
        states.extend(config.state_mappings.iter().cloned());

        Self {
            overrides: config.overrides.clone(),
            actions,
            states,
            poll_interval,
        }
    }

    fn action_rule(&self, obj: &BondObject, action: &str) -> Option<Resolved<'_>> {
        let by_id = self.overrides.iter().rev().find(|r| {
            pattern_matches(&r.matcher.device_id, &obj.id)
                && r.matcher
                    .action
                    .as_deref()
                    .is_some_and(|a| pattern_matches(a, action))
        });
        if let Some(rule) = by_id {
            return Some(resolve(rule));
        }
        self.actions
            .iter()
            .rev()
            .find(|r| {
                pattern_matches(&r.matcher.action, action)
                    && type_matches(r.matcher.device_type.as_deref(), &obj.object_type)
            })
            .map(resolve)
    }

    fn state_rule(&self, obj: &BondObject, key: &str) -> Option<Resolved<'_>> {
        let by_id = self.overrides.iter().rev().find(|r| {
            pattern_matches(&r.matcher.device_id, &obj.id)
                && r.matcher
                    .state_key
                    .as_deref()
                    .is_some_and(|k| pattern_matches(k, key))
        });
        if let Some(rule) = by_id {
            return Some(resolve(rule));
        }
        self.states
            .iter()
            .rev()
            .find(|r| {
                pattern_matches(&r.matcher.state_key, key)
                    && type_matches(r.matcher.device_type.as_deref(), &obj.object_type)
            })
            .map(resolve)
    }

    pub fn map_object(&self, obj: &BondObject) -> MappedObject {
        let mut mapped = MappedObject::default();

        for action in &obj.actions {
            match self.action_rule(obj, &action.name) {
                Some(Resolved::Ignore) => {}
                Some(Resolved::Use(target)) => {
                    mapped.outputs.push(self.output(obj, &action.name, target));
                }
                None => {
                    warn!(
                        "Unknown action '{}' for {} {} ({})",
                        action.name, obj.kind, obj.id, obj.object_type
                    );
                    mapped.outputs.extend(self.review_outputs(obj, &action.name));
                    mapped.unknown_actions.push(action.name.clone());
                }
            }
        }

        for (key, value) in &obj.state {
            // Hash of the state, not a value.
            if key == "_" {
                continue;
            }
            let fallback;
            let target = match self.state_rule(obj, key) {
                Some(Resolved::Ignore) => continue,
                Some(Resolved::Use(target)) => target,
                None => {
                    fallback = Target {
                        signal: Some(infer_signal(value)),
                        description: Some(format!("State {}", key)),
                        ..Target::default()
                    };
                    &fallback
                }
            };
            mapped.inputs.push(self.input(obj, key, target));
        }

        mapped
    }

    fn output(&self, obj: &BondObject, action: &str, target: &Target) -> VirtualOutput {
        let signal = target.signal.unwrap_or(SignalType::Digital);
        let (mut min, mut max) = (DEFAULT_MIN, DEFAULT_MAX);
        if signal == SignalType::Analog {
            if let Some(range) = target.range {
                (min, max) = (range.min, range.max);
            }
            if target.query_device_range && action == "SetSpeed" {
                // Speeds start at 1; anything at or below that is not a range.
                if let Some(max_speed) = obj.property_f64("max_speed").filter(|m| *m > 1.0) {
                    (min, max) = (1.0, max_speed);
                }
            }
        }

        VirtualOutput {
            kind: obj.kind,
            object_id: obj.id.clone(),
            object_name: obj.name.clone(),
            location: obj.location.clone(),
            action: action.to_string(),
            command: canonical_name(action),
            signal,
            description: target.description.clone().unwrap_or_default(),
            unit: target.unit.clone(),
            min,
            max,
            invert: target.invert,
            review: None,
        }
    }

    /// Digital and analog guesses; the user keeps whichever works.
    fn review_outputs(&self, obj: &BondObject, action: &str) -> [VirtualOutput; 2] {
        let guess = |variant: ReviewVariant, signal: SignalType, label: &str| {
            let target = Target {
                signal: Some(signal),
                description: Some(format!("Unknown Action {} ({} Test)", action, label)),
                ..Target::default()
            };
            let mut output = self.output(obj, action, &target);
            output.command = format!("{}_{}", output.command, label.to_lowercase());
            output.review = Some(variant);
            output
        };
        [
            guess(ReviewVariant::Digital, SignalType::Digital, "Digital"),
            guess(ReviewVariant::Analog, SignalType::Analog, "Analog"),
        ]
    }

    fn input(&self, obj: &BondObject, key: &str, target: &Target) -> VirtualInput {
        VirtualInput {
            kind: obj.kind,
            object_id: obj.id.clone(),
            object_name: obj.name.clone(),
            location: obj.location.clone(),
            state_key: key.to_string(),
            signal: target.signal.unwrap_or(SignalType::Text),
            description: target.description.clone().unwrap_or_default(),
            unit: target.unit.clone(),
            poll_interval: target.poll_interval.unwrap_or(self.poll_interval),
        }
    }
}
