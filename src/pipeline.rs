use crate::bond::{discovery, BondClient, BondObject, ObjectKind};
use crate::config::MappingConfig;
use crate::consts;
use crate::error::Result;
use crate::loxone::{Addon, Bridge, MappedObject, Mapper, ReviewVariant};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Everything a single generator run needs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub token: String,
    pub out: PathBuf,
    pub config: Option<PathBuf>,
    pub include_state: bool,
    /// Overrides `global_settings.poll_interval`.
    pub poll_interval: Option<u32>,
    pub emit_intermediate: Option<PathBuf>,
    pub timeout: Duration,
    pub dry_run: bool,
}

impl Settings {
    pub fn new(host: &str, token: &str) -> Self {
        Self {
            host: host.to_string(),
            token: token.to_string(),
            out: PathBuf::from(consts::DEFAULT_OUTPUT),
            config: None,
            include_state: true,
            poll_interval: None,
            emit_intermediate: None,
            timeout: Duration::from_secs_f64(consts::DEFAULT_TIMEOUT_SECS),
            dry_run: false,
        }
    }
}

/// Action we had to guess for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction {
    pub object_id: String,
    pub object_name: String,
    pub action: String,
}

#[derive(Debug, Default)]
pub struct Summary {
    pub devices: usize,
    pub groups: usize,
    pub outputs: usize,
    pub inputs: usize,
    pub poll_interval: u32,
    pub unknown: Vec<UnknownAction>,
    /// None on dry runs and when nothing was found.
    pub written: Option<PathBuf>,
}

fn log_object(obj: &BondObject, mapped: &MappedObject) {
    info!("  [{}] {} ({})", obj.kind, obj.name, obj.object_type);
    info!("    ID: {}", obj.id);
    info!("    Location: {}", obj.location);
    let actions: Vec<&str> = obj.actions.iter().map(|a| a.name.as_str()).collect();
    info!("    Actions: {}", actions.join(", "));
    info!("    -> Mapped to {} Virtual Outputs", mapped.outputs.len());
    if !mapped.inputs.is_empty() {
        let keys: Vec<&str> = mapped.inputs.iter().map(|i| i.state_key.as_str()).collect();
        info!(
            "    -> State: {} ({} Virtual Inputs)",
            keys.join(", "),
            mapped.inputs.len()
        );
    }
}

/// Print override snippets the user can paste into the mapping file.
fn report_unknown(unknown: &[UnknownAction]) {
    if unknown.is_empty() {
        return;
    }
    warn!("UNKNOWN ACTIONS DETECTED");
    for u in unknown {
        warn!("  Action '{}' on device {} ({})", u.action, u.object_name, u.object_id);
        warn!("    Generated test outputs: A) digital (momentary), B) analog (0-100)");
        warn!("    Test them in Loxone Config and add the one that works to your mapping file:");
        for variant in [ReviewVariant::Digital, ReviewVariant::Analog] {
            let loxone = match variant {
                ReviewVariant::Digital => json!({"type": "digital", "description": u.action}),
                ReviewVariant::Analog => json!({
                    "type": "analog",
                    "range": {"min": 0, "max": 100},
                    "description": u.action
                }),
            };
            warn!("    {}", override_snippet(u, loxone));
        }
    }
}

/// One `overrides` entry pinning an unknown action to a tested target.
fn override_snippet(unknown: &UnknownAction, loxone: Value) -> String {
    json!({
        "match": {"device_id": unknown.object_id, "action": unknown.action},
        "loxone": loxone
    })
    .to_string()
}

/// Discover, map and (unless dry-running) write the addon.
///
/// All network traffic happens before anything touches the disk, so a failed
/// run leaves no output behind.
pub async fn run(settings: &Settings) -> Result<Summary> {
    let config = MappingConfig::load(settings.config.as_deref())?;
    let poll_interval = settings
        .poll_interval
        .or(config.global_settings.poll_interval)
        .unwrap_or(consts::DEFAULT_POLL_INTERVAL);

    let client = BondClient::new(&settings.host, &settings.token, settings.timeout)?;
    info!("Discovering Bond Bridge at {}...", client.base());

    let version = client.sys_version().await?;
    let bridge = Bridge {
        base_url: client.base().to_string(),
        token: settings.token.clone(),
        bond_id: version.bondid.unwrap_or_else(|| consts::UNKNOWN.into()),
        firmware: version.fw_ver.unwrap_or_else(|| consts::UNKNOWN.into()),
    };
    info!("Bond ID: {}", bridge.bond_id);
    info!("Firmware: {}", bridge.firmware);

    let objects = discovery::collect_objects(&client, settings.include_state).await?;
    let mut summary = Summary {
        poll_interval,
        ..Summary::default()
    };
    if objects.is_empty() {
        warn!("No devices or groups found!");
        return Ok(summary);
    }

    summary.devices = objects.iter().filter(|o| o.kind == ObjectKind::Device).count();
    summary.groups = objects.iter().filter(|o| o.kind == ObjectKind::Group).count();
    info!("Discovered {} Devices, {} Groups:", summary.devices, summary.groups);

    let mapper = Mapper::new(&config, poll_interval);
    let mut entries = Vec::with_capacity(objects.len());
    for obj in objects {
        let mapped = mapper.map_object(&obj);
        log_object(&obj, &mapped);

        summary.outputs += mapped.outputs.len();
        summary.inputs += mapped.inputs.len();
        summary.unknown.extend(mapped.unknown_actions.iter().map(|action| UnknownAction {
            object_id: obj.id.clone(),
            object_name: obj.name.clone(),
            action: action.clone(),
        }));
        entries.push((obj, mapped));
    }
    report_unknown(&summary.unknown);

    info!("Summary:");
    info!("  Total Virtual Outputs: {}", summary.outputs);
    info!("  Total Virtual Inputs: {}", summary.inputs);
    info!("  State Polling Interval: {} seconds", poll_interval);

    let addon = Addon::build(&bridge, poll_interval, &entries)?;
    if settings.dry_run {
        info!("Dry run completed. No files written.");
        return Ok(summary);
    }

    // Archive goes last so a failing intermediate write leaves no addon behind.
    if let Some(dir) = &settings.emit_intermediate {
        addon.write_intermediate(dir)?;
        info!("Intermediate files: {}", dir.display());
    }
    addon.write_archive(&settings.out)?;
    info!("Generated: {}", settings.out.display());
    summary.written = Some(settings.out.clone());

    Ok(summary)
}
