use bond2loxone::consts;
use bond2loxone::Settings;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

/// Generate a Loxone .LxAddon by scanning a Bond Bridge local API (v2).
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Bond Bridge IP/host, eg. 192.168.1.13
    #[arg(long)]
    host: String,
    /// Bond local token
    #[arg(long, env = "BOND_TOKEN", hide_env_values = true)]
    token: String,

    #[arg(long, default_value = consts::DEFAULT_OUTPUT)]
    out: PathBuf,
    /// JSON (or YAML) mapping file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip state queries; no virtual inputs are generated.
    #[arg(long)]
    no_state: bool,
    /// Polling interval of virtual inputs in seconds [default: 30]
    #[arg(long)]
    state_poll_interval: Option<u32>,
    /// Also write desc.json/template.xml/inventory.json into this directory
    #[arg(long)]
    emit_intermediate: Option<PathBuf>,
    /// HTTP timeout in seconds
    #[arg(long, default_value_t = consts::DEFAULT_TIMEOUT_SECS)]
    timeout: f64,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only report errors
    #[arg(short, long)]
    quiet: bool,
    /// Show what would be generated without creating files
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn settings(&self) -> anyhow::Result<Settings> {
        let timeout = match Duration::try_from_secs_f64(self.timeout) {
            Ok(timeout) if !timeout.is_zero() => timeout,
            _ => anyhow::bail!("--timeout must be a positive number of seconds"),
        };
        if self.state_poll_interval == Some(0) {
            anyhow::bail!("--state-poll-interval must be positive");
        }
        Ok(Settings {
            host: self.host.clone(),
            token: self.token.clone(),
            out: self.out.clone(),
            config: self.config.clone(),
            include_state: !self.no_state,
            poll_interval: self.state_poll_interval,
            emit_intermediate: self.emit_intermediate.clone(),
            timeout,
            dry_run: self.dry_run,
        })
    }

    fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

fn init_log(level: LevelFilter) -> anyhow::Result<()> {
    let timer = fmt::time::ChronoLocal::new("%H:%M:%S%.3f".to_string());

    // Configure a custom event formatter
    let format = fmt::format()
        .with_level(true)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_source_location(level >= LevelFilter::DEBUG)
        .with_timer(timer)
        .compact();

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env()?
        .add_directive("reqwest=info".parse()?)
        .add_directive("hyper=info".parse()?);

    fmt().event_format(format).with_env_filter(filter).init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_log(args.level())?;

    let settings = args.settings()?;
    info!("Starting {} {}", consts::GENERATOR_NAME, consts::GENERATOR_VERSION);

    bond2loxone::run(&settings).await?;
    Ok(())
}
