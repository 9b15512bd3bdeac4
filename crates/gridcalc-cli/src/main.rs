//! gridcalc CLI - interactive spreadsheet shell

mod shell;

use anyhow::{Context, Result};
use clap::Parser;
use shell::{OutputFormat, Shell};
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "gridcalc")]
#[command(author, version, about = "Spreadsheet recalculation shell")]
struct Cli {
    /// Read commands from a file instead of stdin
    #[arg(short, long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Echo each command before its output
    #[arg(short, long)]
    echo: bool,

    /// Render values, get and deps output as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log level (error, warn, info, debug, trace); overrides -v
    #[arg(long, env = "GRIDCALC_LOG")]
    log_level: Option<Level>,
}

impl Cli {
    fn level(&self) -> Level {
        if let Some(level) = self.log_level {
            return level;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(cli.level())
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))?;

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.script {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open '{}'", path.display()))?;
            tracing::info!(script = %path.display(), "running script");
            let mut shell = Shell::new(format, cli.echo, false);
            shell.run(BufReader::new(file), &mut out)
        }
        None => {
            let stdin = io::stdin();
            let prompt = stdin.is_terminal();
            let mut shell = Shell::new(format, cli.echo, prompt);
            shell.run(stdin.lock(), &mut out)
        }
    }
}
