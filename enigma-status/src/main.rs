//! Enigma license status tool
//!
//! Prints what the license facade sees on this machine and lets an operator
//! check or register a key without writing any code.
//!
//! Usage:
//!   enigma-status --fixture dev.toml status
//!   enigma-status check --name "Ada Lovelace" --key ABCD-1234
//!   enigma-status register --name "Ada Lovelace" --key ABCD-1234

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use enigma_status::{StatusReport, open_engine};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "enigma-status")]
#[command(about = "Inspect and register the Enigma license of this machine")]
struct Args {
    /// Engine fixture (TOML) to use instead of the protector runtime
    #[arg(short, long)]
    fixture: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show protection flags, registration and trial state
    Status,
    /// Check a key without registering it
    Check {
        #[arg(long)]
        name: String,
        #[arg(long)]
        key: String,
    },
    /// Validate and persist a key, then show the new state
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        key: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let engine = open_engine(args.fixture.as_deref())?;
    let license = enigma_license::install(engine)?;

    match args.command.unwrap_or(Command::Status) {
        Command::Status => print_report(&StatusReport::collect(license), args.json)?,
        Command::Check { name, key } => {
            let registration = license.registration();
            let valid = registration.check_candidate_key(&name, &key);
            if args.json {
                let info = registration.key_information(&name, &key);
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "valid": valid,
                        "key_info": info,
                    }))?
                );
            } else {
                println!("{}", if valid { "valid" } else { "invalid" });
            }
            if !valid {
                std::process::exit(1);
            }
        }
        Command::Register { name, key } => {
            if !license.registration().save_key(&name, &key) {
                bail!("key for {name:?} was rejected");
            }
            info!("Registered {}", name);
            print_report(&StatusReport::collect(license), args.json)?;
        }
    }

    Ok(())
}

fn print_report(report: &StatusReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}
