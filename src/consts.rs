/// Software version
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GENERATOR_NAME: &str = "bond2loxone";
pub const GENERATOR_URL: &str = env!("CARGO_PKG_HOMEPAGE");

/// Header carrying the local Bond token.
pub const BOND_TOKEN_HEADER: &str = "BOND-Token";
pub const BOND_API_PREFIX: &str = "/v2";

pub const DEFAULT_TIMEOUT_SECS: f64 = 3.0;
pub const DEFAULT_POLL_INTERVAL: u32 = 30;
pub const DEFAULT_OUTPUT: &str = "bond2loxone.LxAddon";

/// Files packed inside the LxAddon archive, in archive order.
pub const DESC_FILE: &str = "desc.json";
pub const TEMPLATE_FILE: &str = "template.xml";
pub const INVENTORY_FILE: &str = "inventory.json";

pub const UNKNOWN: &str = "UNKNOWN";
