//! `devsnap` command-line tool.
//!
//! Polls one device for its status commands, prints the sections, and
//! saves them to `<output-dir>/<prefix>_<YYYYMMDD_HHMMSS>.txt`.
//!
//! ```bash
//! devsnap --host 192.168.10.1 --user admin --platform fortinet
//! devsnap --config fw01.toml --json --no-save
//! devsnap --host 10.0.0.1 --platform cisco_ios -c "Version=show version" -c "ARP=show ip arp"
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use inquire::{Password, PasswordDisplayMode, Text};
use log::{error, info, warn};

use devsnap::config::{JobConfig, OutputFormat, Overrides};
use devsnap::{CommandEntry, HostKeyVerification, PlatformRegistry, Runner, SessionBuilder, report};

#[derive(Parser, Debug)]
#[command(name = "devsnap", version, about = "Collect status snapshots from network devices over SSH")]
struct Cli {
    /// Job file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device hostname or IP
    #[arg(long)]
    host: Option<String>,

    /// SSH port
    #[arg(short, long)]
    port: Option<u16>,

    /// SSH username (prompted when missing)
    #[arg(short, long)]
    user: Option<String>,

    /// SSH password (prompted when missing and no key is given)
    #[arg(short = 'P', long, env = "DEVSNAP_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Private key for public-key authentication
    #[arg(short, long)]
    key: Option<PathBuf>,

    /// Passphrase for an encrypted private key
    #[arg(long, env = "DEVSNAP_KEY_PASSPHRASE", hide_env_values = true)]
    key_passphrase: Option<String>,

    /// Device platform (see --list-platforms)
    #[arg(long)]
    platform: Option<String>,

    /// Connect timeout in seconds
    #[arg(long)]
    connect_timeout: Option<u64>,

    /// Per-command timeout in seconds
    #[arg(long)]
    command_timeout: Option<u64>,

    /// Pause between commands in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Command to run as LABEL=COMMAND (repeatable, replaces the job's list)
    #[arg(short = 'c', long = "command", value_parser = parse_command)]
    commands: Vec<CommandEntry>,

    /// Directory for the report file
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Report file name prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Print only, do not write the report file
    #[arg(long)]
    no_save: bool,

    /// Print the results as JSON
    #[arg(long)]
    json: bool,

    /// Host key checking: strict, accept-new or disabled
    #[arg(long)]
    host_key: Option<HostKeyVerification>,

    /// known_hosts file to check against
    #[arg(long)]
    known_hosts: Option<PathBuf>,

    /// List the built-in platforms and exit
    #[arg(long)]
    list_platforms: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_command(entry: &str) -> std::result::Result<CommandEntry, String> {
    CommandEntry::parse(entry).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG overrides the default filter
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.list_platforms {
        let registry = PlatformRegistry::read_global()?;
        for name in registry.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut config = match cli.config.as_deref() {
        Some(path) => JobConfig::load(path)?,
        None => JobConfig::default(),
    };
    config.apply(Overrides {
        host: cli.host,
        port: cli.port,
        username: cli.user,
        platform: cli.platform,
        key: cli.key,
        connect_timeout_secs: cli.connect_timeout,
        command_timeout_secs: cli.command_timeout,
        inter_command_delay_ms: cli.delay_ms,
        host_key: cli.host_key,
        known_hosts: cli.known_hosts,
        commands: cli.commands,
        output_dir: cli.output_dir,
        prefix: cli.prefix,
        no_save: cli.no_save,
        json: cli.json,
    });
    config.validate()?;

    let platform = PlatformRegistry::lookup(&config.device.platform)?;
    let spec = config.command_spec(&platform)?;
    let host = config.device.host.clone().unwrap_or_default();

    let username = match config.device.username.clone() {
        Some(username) => username,
        None => Text::new("Enter username:")
            .prompt()
            .context("reading username")?,
    };

    let mut builder = SessionBuilder::new(&host)
        .port(config.device.port)
        .username(username)
        .custom_platform(platform)
        .timeout(config.connect_timeout())
        .host_key_verification(config.device.host_key);
    if let Some(path) = &config.device.known_hosts {
        builder = builder.known_hosts_path(path);
    }
    builder = match (&config.device.key, cli.key_passphrase) {
        (Some(key), Some(passphrase)) => builder.private_key_with_passphrase(key, passphrase),
        (Some(key), None) => builder.private_key(key),
        (None, _) => {
            let password = match cli.password {
                Some(password) => password,
                None => Password::new("Enter password:")
                    .with_display_mode(PasswordDisplayMode::Masked)
                    .without_confirmation()
                    .prompt()
                    .context("reading password")?,
            };
            builder.password(password)
        }
    };

    let mut session = builder.build()?;

    info!("Connecting to {}:{}...", host, config.device.port);
    session
        .open()
        .await
        .with_context(|| format!("connecting to {}", host))?;

    let mut runner = Runner::new(config.runner_config());
    let results = devsnap::runner::run_and_release(&mut runner, &mut session, &spec).await?;

    let mut stdout = io::stdout().lock();
    match config.output.format {
        OutputFormat::Text => report::render_sections(&mut stdout, &results)?,
        OutputFormat::Json => writeln!(stdout, "{}", report::render_json(&results)?)?,
    }
    stdout.flush()?;
    drop(stdout);

    let failures = results.failure_count();
    if failures > 0 {
        warn!("{} of {} commands failed", failures, results.len());
    }

    if config.output.save {
        let path = report::save(&config.output.directory, &config.report_prefix(), &results)?;
        println!("\nStatus information saved to: {}", path.display());
    }

    Ok(())
}
