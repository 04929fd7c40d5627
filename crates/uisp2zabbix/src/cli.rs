//! Clap derive structures for the `uisp2zabbix` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// uisp2zabbix -- push UISP point-to-point link telemetry into Zabbix
#[derive(Debug, Parser)]
#[command(
    name = "uisp2zabbix",
    version,
    about = "Bridge UISP point-to-point link telemetry into Zabbix",
    long_about = "Polls UISP for wireless data links, keeps a Zabbix template and one host \
        per link in place, and ships every link's statistics to a Zabbix trapper.\n\n\
        Without flags the bridge runs until interrupted. Connection settings come \
        from the environment (UISP_ENDPOINT, UISP_AUTH_TOKEN, ZABBIX_URL, \
        ZABBIX_UNAME, ZABBIX_PWORD, ZABBIX_ENDPOINT) or a TOML config file."
)]
pub struct Cli {
    /// Print one snapshot of wireless data links and exit
    #[arg(long, conflicts_with_all = ["force_update_schema", "force_update_hosts", "show_config"])]
    pub dump: bool,

    /// Output format for --dump
    #[arg(long, short = 'o', value_enum, default_value = "json")]
    pub output: OutputFormat,

    /// Rewrite every template item, run one cycle, and exit
    #[arg(long, visible_alias = "update-templates")]
    pub force_update_schema: bool,

    /// Rewrite groups and tags of existing hosts, run one cycle, and exit
    #[arg(long, visible_alias = "update-hosts")]
    pub force_update_hosts: bool,

    /// Print the effective configuration (secrets masked) and exit
    #[arg(long)]
    pub show_config: bool,

    /// Path to a TOML config file
    #[arg(long, short = 'c', env = "UISP2ZABBIX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", env = "UISP2ZABBIX_LOG_FORMAT")]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}
