mod cli;
mod error;
mod output;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use uisp2zabbix_config::{Settings, load_settings};
use uisp2zabbix_core::MaintenanceFlags;

use crate::cli::{Cli, LogFormat};
use crate::error::{CliError, exit_code};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_format);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, format: LogFormat) {
    // The bridge is a daemon: progress at info is the useful default.
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let settings = load_settings(cli.config.as_deref())?;

    if cli.show_config {
        return output::print_output(&settings.to_redacted_toml()?);
    }
    if cli.dump {
        return dump(&cli, &settings).await;
    }

    let maintenance = MaintenanceFlags {
        force_update_schema: cli.force_update_schema,
        force_update_hosts: cli.force_update_hosts,
    };
    let config = settings.validate()?.into_bridge_config(maintenance);

    let mut bridge = uisp2zabbix_core::connect(&config).await?;

    let cancel = CancellationToken::new();
    tokio::spawn(stop_on_interrupt(cancel.clone()));

    let result = bridge.run(&cancel).await;
    bridge.shutdown().await;
    result.map_err(CliError::from)
}

/// One UISP snapshot to stdout. Zabbix settings are not required.
async fn dump(cli: &Cli, settings: &Settings) -> Result<(), CliError> {
    let uisp = settings.uisp()?;
    let links = uisp2zabbix_core::dump_links(&uisp, &settings.tls(), settings.timeout()?).await?;
    info!(links = links.len(), "dumping wireless data links");
    output::print_output(&output::render(cli.output, &links)?)
}

/// First interrupt stops the bridge, a second one exits without waiting
/// for the Zabbix logout.
async fn stop_on_interrupt(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("interrupt received, stopping");
    cancel.cancel();

    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("second interrupt, exiting now");
        std::process::exit(exit_code::INTERRUPTED);
    }
}
