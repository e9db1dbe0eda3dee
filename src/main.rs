use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use slm_client::client::LicenseClient;
use slm_client::config::ClientConfig;

#[derive(Parser, Debug)]
#[command(name = "slm_client")]
#[command(about = "Activate, check and deactivate licenses against an SLM server")]
struct Args {
    /// Configuration file (defaults to ./slm_client.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log every server query
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Activate a license key for a domain
    Activate {
        key: String,
        #[arg(short, long)]
        domain: String,
    },
    /// Deactivate the installed license key
    Deactivate {
        #[arg(short, long)]
        domain: String,
    },
    /// Re-check the installed license with the server
    Check,
    /// Show the current entitlement
    Status {
        /// Enable a demo period of this many days
        #[arg(long, default_value_t = 0)]
        demo_days: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = match ClientConfig::load_from(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut client = match LicenseClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let ok = match args.command {
        Command::Activate { key, domain } => {
            let ok = client.activate(&key, &domain).await;
            println!("{}", if ok { "License activated." } else { "Activation failed." });
            ok
        }
        Command::Deactivate { domain } => {
            let ok = client.deactivate(&domain).await;
            println!(
                "{}",
                if ok { "License deactivated." } else { "Deactivation failed." }
            );
            ok
        }
        Command::Check => {
            let active = client.refresh().await;
            println!("License active: {active}");
            active
        }
        Command::Status { demo_days } => {
            client.set_demo_period(demo_days).await;
            let key = client.license_key().await;
            let package = client.package().await;

            println!(
                "License key: {}",
                if key.is_empty() { "(none)" } else { key.as_str() }
            );
            if let Some(start) = client.demo_start() {
                println!(
                    "Demo: started {start}, {} day(s) left",
                    client.demo_days_left()
                );
            }
            match &package {
                Some(package) => println!("Package: {package}"),
                None => println!("Package: (not entitled)"),
            }
            package.is_some()
        }
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
