//! Loxone Config template: one `VirtualOut` for the bridge, one
//! `VirtualInHttp` per object with state.

use super::addon::Bridge;
use super::mapper::{VirtualInput, VirtualOutput};
use crate::bond::ObjectKind;
use crate::config::SignalType;
use crate::consts;

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c => out.push(c),
        }
    }
    out
}

/// Whole values without a trailing `.0`.
fn number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn bool_attr(value: bool) -> String {
    value.to_string()
}

fn tag(out: &mut String, indent: usize, name: &str, attrs: &[(&str, String)], empty: bool) {
    out.push_str(&"  ".repeat(indent));
    out.push('<');
    out.push_str(name);
    for (key, value) in attrs {
        out.push_str(&format!(" {}=\"{}\"", key, escape(value)));
    }
    out.push_str(if empty { "/>\n" } else { ">\n" });
}

fn close(out: &mut String, indent: usize, name: &str) {
    out.push_str(&format!("{}</{}>\n", "  ".repeat(indent), name));
}

fn object_path(kind: ObjectKind, id: &str) -> String {
    format!("{}/{}/{}", consts::BOND_API_PREFIX, kind.collection(), id)
}

fn unit(unit: &Option<String>) -> String {
    match unit {
        Some(unit) => format!("<v> {}", unit),
        None => "<v>".to_string(),
    }
}

fn output_command(out: &mut String, bridge: &Bridge, o: &VirtualOutput) {
    let analog = o.signal != SignalType::Digital;
    let post = match o.signal {
        SignalType::Digital => "{}".to_string(),
        SignalType::Analog => "{\"argument\": <v>}".to_string(),
        SignalType::Text => "{\"argument\": \"<v>\"}".to_string(),
    };
    let (dest_low, dest_high) = if o.invert { (o.max, o.min) } else { (o.min, o.max) };

    tag(
        out,
        2,
        "VirtualOutCmd",
        &[
            ("Title", format!("{} {}", o.object_name, o.command)),
            ("Comment", o.description.clone()),
            ("CmdOnMethod", "PUT".into()),
            (
                "CmdOn",
                format!("{}/actions/{}", object_path(o.kind, &o.object_id), o.action),
            ),
            ("CmdOnHTTP", format!("{}: {}", consts::BOND_TOKEN_HEADER, bridge.token)),
            ("CmdOnPost", post),
            ("CmdOffMethod", "GET".into()),
            ("CmdOff", String::new()),
            ("CmdOffHTTP", String::new()),
            ("CmdOffPost", String::new()),
            ("Analog", bool_attr(analog)),
            ("Repeat", "0".into()),
            ("RepeatRate", "0".into()),
            ("SourceValLow", number(o.min)),
            ("DestValLow", number(dest_low)),
            ("SourceValHigh", number(o.max)),
            ("DestValHigh", number(dest_high)),
            ("Unit", unit(&o.unit)),
        ],
        true,
    );
}

fn input_command(out: &mut String, i: &VirtualInput) {
    let analog = i.signal != SignalType::Digital;
    tag(
        out,
        2,
        "VirtualInHttpCmd",
        &[
            ("Title", format!("{} {}", i.object_name, i.state_key)),
            ("Comment", i.description.clone()),
            ("Check", format!("\\i\"{}\":\\i\\v", i.state_key)),
            ("Signed", "true".into()),
            ("Analog", bool_attr(analog)),
            ("SourceValLow", "0".into()),
            ("DestValLow", "0".into()),
            ("SourceValHigh", "100".into()),
            ("DestValHigh", "100".into()),
            ("DefVal", "0".into()),
            ("MinVal", "-10000".into()),
            ("MaxVal", "10000".into()),
            ("Unit", unit(&i.unit)),
        ],
        true,
    );
}

/// Render `template.xml`. Inputs are grouped by object in the order given.
pub fn render(bridge: &Bridge, outputs: &[VirtualOutput], inputs: &[VirtualInput]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    tag(
        &mut out,
        0,
        "Templates",
        &[
            ("Generator", consts::GENERATOR_NAME.into()),
            ("Version", consts::GENERATOR_VERSION.into()),
        ],
        false,
    );

    tag(
        &mut out,
        1,
        "VirtualOut",
        &[
            ("Title", format!("Bond Bridge {}", bridge.bond_id)),
            ("Comment", format!("Firmware {}", bridge.firmware)),
            ("Address", bridge.base_url.clone()),
            ("CmdInit", String::new()),
            ("CloseAfterSend", "true".into()),
            ("CmdSep", String::new()),
        ],
        outputs.is_empty(),
    );
    if !outputs.is_empty() {
        for o in outputs {
            output_command(&mut out, bridge, o);
        }
        close(&mut out, 1, "VirtualOut");
    }

    let mut rest = inputs;
    while let Some(first) = rest.first() {
        let len = rest
            .iter()
            .take_while(|i| i.kind == first.kind && i.object_id == first.object_id)
            .count();
        let (group, tail) = rest.split_at(len);
        rest = tail;

        let polling = group.iter().map(|i| i.poll_interval).min().unwrap_or(first.poll_interval);
        tag(
            &mut out,
            1,
            "VirtualInHttp",
            &[
                ("Title", first.object_name.clone()),
                ("Comment", first.location.clone()),
                (
                    "Address",
                    format!(
                        "{}{}/state",
                        bridge.base_url,
                        object_path(first.kind, &first.object_id)
                    ),
                ),
                ("PollingTime", polling.to_string()),
            ],
            false,
        );
        for i in group {
            input_command(&mut out, i);
        }
        close(&mut out, 1, "VirtualInHttp");
    }

    close(&mut out, 0, "Templates");
    out
}
