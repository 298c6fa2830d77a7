use anyhow::Context;
use clap::{CommandFactory, Parser};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use webos_remote::config::{self, Config};
use webos_remote::driver::RunResult;
use webos_remote::ssap::{Command, Invocation, Outcome};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INTERRUPTED: u8 = 130;

/// wtv - remote control for LG webOS TVs
#[derive(Parser, Debug)]
#[command(name = "wtv")]
#[command(version)]
#[command(about = "Remote control for LG webOS TVs over the local network")]
#[command(long_about = "wtv talks to an LG webOS TV over its local WebSocket control API.

The first run against a TV shows a pairing prompt on screen; once accepted, the
client key is saved to the key file and reused on later runs.

Quick start:
  1. Run 'wtv --cmd initialize-key --addr <tv-ip>:3000' and accept the prompt
  2. Run 'wtv --cmd info' to check the connection
  3. Optionally run 'wtv --init' to save the TV address in .webos-remote.toml")]
#[command(after_help = after_help())]
pub struct Cli {
    /// TV address as host:port (default: 192.168.1.237:3000)
    #[arg(long)]
    pub addr: Option<String>,

    /// File holding the client key (default: key)
    #[arg(long = "key-file")]
    pub key_file: Option<PathBuf>,

    /// Command to run (see the list below)
    #[arg(long)]
    pub cmd: Option<String>,

    /// Argument for the command (app name or id, volume, message, input id)
    #[arg(long, default_value = "")]
    pub arg: String,

    /// JSON object merged into the launch request as `params`
    #[arg(long)]
    pub payload: Option<String>,

    /// Tunnel the connection through a SOCKS5 proxy at host:port
    #[arg(long = "use-socks5-proxy")]
    pub socks5_proxy: Option<String>,

    /// Path to config file (defaults to .webos-remote.toml)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Write a starter config file and exit
    #[arg(long)]
    pub init: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn config_path(&self) -> &str {
        self.config.as_deref().unwrap_or(config::DEFAULT_CONFIG_PATH)
    }
}

fn after_help() -> String {
    let mut help = String::from("Commands:\n");
    for command in Command::ALL {
        let example = command.example();
        if example.is_empty() {
            help.push_str(&format!("  {}\n", command));
        } else {
            help.push_str(&format!("  {:<16} {}\n", command, example));
        }
    }
    help
}

/// Print usage to stderr, for runs without `--cmd`.
pub fn print_usage() {
    let mut command = Cli::command();
    eprintln!("{}", command.render_help());
}

/// Write a commented starter config unless one already exists.
pub fn init_config(config_path: &str) -> anyhow::Result<()> {
    if Path::new(config_path).exists() {
        println!("Config file '{}' already exists.", config_path);
        return Ok(());
    }

    let config = Config {
        addr: Some(config::DEFAULT_ADDR.to_string()),
        key_file: Some(PathBuf::from(config::DEFAULT_KEY_FILE)),
        socks5_proxy: None,
        close_timeout_ms: Some(config::DEFAULT_CLOSE_TIMEOUT_MS),
    };
    config
        .save(config_path)
        .with_context(|| format!("Failed to write config to '{}'", config_path))?;

    let mut file = OpenOptions::new()
        .append(true)
        .open(config_path)
        .with_context(|| format!("Failed to append to '{}'", config_path))?;
    writeln!(file, "\n# Route the connection through a SOCKS5 proxy")?;
    writeln!(file, "# socks5_proxy = \"127.0.0.1:1080\"")?;

    println!("Created {}", config_path);
    println!("\nNext steps:");
    println!("  1. Set addr in {} to your TV's address", config_path);
    println!("  2. Run 'wtv --cmd initialize-key' and accept the prompt on the TV");

    Ok(())
}

/// Config file merged with command-line overrides, then validated.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let path = cli.config_path();
    let mut config = Config::load(path, cli.config.is_some())
        .with_context(|| format!("Failed to load config from '{}'", path))?;

    if let Some(addr) = &cli.addr {
        config.addr = Some(addr.clone());
    }
    if let Some(key_file) = &cli.key_file {
        config.key_file = Some(key_file.clone());
    }
    if let Some(proxy) = &cli.socks5_proxy {
        config.socks5_proxy = Some(proxy.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Parse `--cmd` and validate its argument and payload.
pub fn build_invocation(cli: &Cli) -> anyhow::Result<Invocation> {
    let Some(name) = cli.cmd.as_deref() else {
        anyhow::bail!("no command given, pass one with --cmd");
    };
    let command: Command = name.parse()?;
    let invocation = Invocation::new(command, cli.arg.as_str(), cli.payload.as_deref())?;
    Ok(invocation)
}

/// Process exit status for a finished run.
pub fn exit_status(result: &anyhow::Result<RunResult>) -> u8 {
    match result {
        Ok(RunResult::Completed(_)) => EXIT_SUCCESS,
        Ok(RunResult::Interrupted) => EXIT_INTERRUPTED,
        Err(_) => EXIT_FAILURE,
    }
}

/// What belongs on stdout: the indented payload of a query, nothing otherwise.
pub fn stdout_text(result: &anyhow::Result<RunResult>) -> Option<String> {
    match result {
        Ok(RunResult::Completed(outcome @ Outcome::Query { .. })) => outcome.stdout_text(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
