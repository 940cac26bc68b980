//! Default mappings for common Bond device types.
//!
//! MS: motorized shades, CF: ceiling fans, LT: lights, FP: fireplaces.

use crate::config::{ActionMatch, ActionRule, Range, Rule, SignalType, StateMatch, StateRule, Target};

struct Entry {
    device_type: &'static str,
    key: &'static str,
    signal: SignalType,
    description: &'static str,
    unit: Option<&'static str>,
    range: Option<(f64, f64)>,
    query_device_range: bool,
}

const fn digital(device_type: &'static str, key: &'static str, description: &'static str) -> Entry {
    Entry {
        device_type,
        key,
        signal: SignalType::Digital,
        description,
        unit: None,
        range: None,
        query_device_range: false,
    }
}

const fn analog(
    device_type: &'static str,
    key: &'static str,
    description: &'static str,
    unit: Option<&'static str>,
    range: Option<(f64, f64)>,
) -> Entry {
    Entry {
        device_type,
        key,
        signal: SignalType::Analog,
        description,
        unit,
        range,
        query_device_range: false,
    }
}

const fn queried(entry: Entry) -> Entry {
    Entry {
        query_device_range: true,
        ..entry
    }
}

const ACTIONS: &[Entry] = &[
    digital("MS", "Open", "Open shade"),
    digital("MS", "Close", "Close shade"),
    digital("MS", "Stop", "Stop shade"),
    digital("MS", "Hold", "Hold shade"),
    digital("MS", "Preset", "Go to preset"),
    queried(analog(
        "MS",
        "SetPosition",
        "Set position (0=open, 100=closed)",
        Some("%"),
        Some((0.0, 100.0)),
    )),
    digital("CF", "TurnOn", "Turn fan on"),
    digital("CF", "TurnOff", "Turn fan off"),
    // Usually replaced by the `max_speed` property.
    queried(analog("CF", "SetSpeed", "Set fan speed", None, Some((1.0, 3.0)))),
    digital("CF", "IncreaseSpeed", "Increase speed"),
    digital("CF", "DecreaseSpeed", "Decrease speed"),
    digital("LT", "TurnLightOn", "Turn light on"),
    digital("LT", "TurnLightOff", "Turn light off"),
    analog("LT", "SetBrightness", "Set brightness", Some("%"), Some((1.0, 100.0))),
    digital("FP", "TurnOn", "Turn fireplace on"),
    digital("FP", "TurnOff", "Turn fireplace off"),
    analog("FP", "SetFlame", "Set flame level", None, Some((1.0, 100.0))),
];

const STATES: &[Entry] = &[
    digital("MS", "open", "Shade open state"),
    analog("MS", "position", "Shade position state", Some("%"), None),
    digital("CF", "power", "Fan power state"),
    analog("CF", "speed", "Fan speed state", None, None),
    digital("LT", "light", "Light power state"),
    analog("LT", "brightness", "Light brightness state", Some("%"), None),
    digital("FP", "power", "Fireplace power state"),
    analog("FP", "flame", "Fireplace flame state", None, None),
];

impl Entry {
    fn target(&self) -> Target {
        Target {
            signal: Some(self.signal),
            description: Some(self.description.to_string()),
            unit: self.unit.map(str::to_string),
            range: self.range.map(|(min, max)| Range { min, max }),
            query_device_range: self.query_device_range,
            ..Target::default()
        }
    }
}

pub fn action_rules() -> Vec<ActionRule> {
    ACTIONS
        .iter()
        .map(|e| Rule {
            matcher: ActionMatch {
                device_type: Some(e.device_type.to_string()),
                action: e.key.to_string(),
            },
            loxone: e.target(),
            ignore: false,
        })
        .collect()
}

pub fn state_rules() -> Vec<StateRule> {
    STATES
        .iter()
        .map(|e| Rule {
            matcher: StateMatch {
                device_type: Some(e.device_type.to_string()),
                state_key: e.key.to_string(),
            },
            loxone: e.target(),
            ignore: false,
        })
        .collect()
}
