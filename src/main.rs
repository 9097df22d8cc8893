mod bridge;
mod command;
mod error;
mod transport;

use anyhow::Result;
use bridge::{BridgeConfig, CommandBridge};
use clap::Parser;
use command::Command;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use transport::ble::PybricksConnector;
use transport::sim::SimConnector;
use transport::HubConnector;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Operator console for the SP-7 color sorter hub.
#[derive(Parser, Debug)]
#[command(name = "sorterlink", version, about)]
struct Args {
    /// Advertised name of the hub to control
    #[arg(long, default_value = "SP-7")]
    hub: String,
    /// Seconds to wait for the hub to appear in a scan
    #[arg(long, default_value_t = 10)]
    scan_timeout: u64,
    /// Seconds to wait for the session to establish
    #[arg(long, default_value_t = 5)]
    connect_timeout: u64,
    /// Use the in-process simulated hub instead of BLE
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();
    let config = BridgeConfig {
        hub_name: args.hub,
        scan_timeout: Duration::from_secs(args.scan_timeout),
        connect_timeout: Duration::from_secs(args.connect_timeout),
    };

    let connector: Arc<dyn HubConnector> = if args.simulate {
        info!("Using the simulated hub");
        Arc::new(SimConnector::new())
    } else {
        Arc::new(PybricksConnector::new().await?)
    };

    info!("Controlling hub {}", config.hub_name);
    let mut bridge = CommandBridge::new(config, connector);
    bridge.start();

    println!("Comandos disponibles (o 'salir'):");
    for cmd in Command::ALL {
        println!("  {:<10} {}", cmd.token(), cmd.label());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(event) = bridge.next_status() => {
                if event.is_error() {
                    warn!("{event}");
                }
                println!("{event}");
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if input.eq_ignore_ascii_case("salir") {
                    break;
                }
                match input.parse::<Command>() {
                    Ok(command) => {
                        println!("→ {}", command::label_for(input));
                        bridge.submit(command);
                    }
                    Err(e) => println!("⚠️ {e}"),
                }
            }
        }
    }

    bridge.stop().await;
    // The worker queues its farewell events before exiting; flush them.
    while let Some(event) = bridge.try_next_status() {
        println!("{event}");
    }
    Ok(())
}
