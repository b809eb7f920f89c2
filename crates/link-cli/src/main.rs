//! gb-link command-line driver
//!
//! Wires transports, game protocols, and the trade partner into runnable
//! modes:
//! - `relay-server`: TCP server bridging two consoles
//! - `relay-client`: serial console <-> relay server forwarder
//! - `bgb-bridge`: BGB emulator <-> serial console
//! - `trade`: mock trade partner over BGB (`trade bgb`) or serial
//!   (`trade serial`)

use anyhow::{Result, bail};
use bgb_tunnel::{BgbLinkServer, BgbServerConfig};
use game_protocols::{PokemonGen1, Tetris};
use link_cable::SerialLink;
use link_cable::serial::DEFAULT_BAUD_RATE;
use link_core::LinkProtocol;
use link_relay::{
    CableForwarder, LinkServer, LinkServerConfig, RelayBridge, SerialTcpClient,
    SerialTcpClientConfig,
};
use std::path::PathBuf;
use trade_partner::{PokemonRecord, TradePartner, TrainerConfig, TrainerRecord, run_as_master};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

const HELP: &str = "\
gb-link - Game Boy link cable bridging over TCP and serial

USAGE:
  gb-link <MODE> [OPTIONS]

MODES:
  relay-server          Bridge two consoles connecting over TCP
    --host <host>       Host to listen on (default: 127.0.0.1)
    --port <port>       Port to listen on (default: 1989)
    --game <game>       Link protocol: pokemon-gen1, tetris (default: pokemon-gen1)
    --seed <seed>       Fixed seed for generated game data (tetris)

  relay-client <serial-port>
    --server-host <h>   Relay server host (default: 127.0.0.1)
    --server-port <p>   Relay server port (default: 1989)
    --baud <rate>       Adapter baud rate (default: 28800)

  relay-local <serial-port-1> <serial-port-2>
    Run a relay server plus one client per console, all in-process
    --game <game>       Link protocol (default: pokemon-gen1)
    --baud <rate>       Adapter baud rate (default: 28800)

  relay-serial <serial-port-1> <serial-port-2>
    Bridge two serial-attached consoles directly, no TCP hop
    --game <game>       Link protocol (default: pokemon-gen1)
    --baud <rate>       Adapter baud rate (default: 28800)

  bgb-bridge <serial-port>
    --bgb-port <port>   Port to listen on for the emulator (default: 8765)
    --baud <rate>       Adapter baud rate (default: 28800)

  trade bgb             Mock trade partner for an emulator
    --port <port>       Port to listen on (default: 8765)
    --trainer <file>    Trainer JSON: {\"name\": ..., \"party\": [{\"species\": ..., \"name\": ...}]}

  trade serial <serial-port>
    --baud <rate>       Adapter baud rate (default: 28800)
    --trainer <file>    Trainer JSON as above

OPTIONS:
  -h, --help            Prints help information
";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{}", HELP);
        return Ok(());
    }

    match args.subcommand()?.as_deref() {
        Some("relay-server") => relay_server(args).await,
        Some("relay-client") => relay_client(args).await,
        Some("relay-local") => relay_local(args).await,
        Some("relay-serial") => relay_serial(args).await,
        Some("bgb-bridge") => bgb_bridge(args).await,
        Some("trade") => trade(args).await,
        Some(other) => bail!("Unknown mode: {}", other),
        None => {
            print!("{}", HELP);
            Ok(())
        }
    }
}

async fn relay_server(mut args: pico_args::Arguments) -> Result<()> {
    let mut config = LinkServerConfig::default();
    if let Some(host) = args.opt_value_from_str("--host")? {
        config.host = host;
    }
    if let Some(port) = args.opt_value_from_str("--port")? {
        config.port = port;
    }

    let protocol = parse_protocol(&mut args)?;

    finish_args(args)?;
    LinkServer::with_config(config, protocol).run().await?;
    Ok(())
}

fn parse_protocol(args: &mut pico_args::Arguments) -> Result<Box<dyn LinkProtocol>> {
    let game: Option<String> = args.opt_value_from_str("--game")?;
    let seed: Option<u64> = args.opt_value_from_str("--seed")?;

    match game.as_deref() {
        None | Some("pokemon-gen1") => Ok(Box::new(PokemonGen1)),
        Some("tetris") => Ok(Box::new(Tetris { seed })),
        Some(other) => bail!("Unknown game protocol: {}", other),
    }
}

async fn relay_client(mut args: pico_args::Arguments) -> Result<()> {
    let server_host: Option<String> = args.opt_value_from_str("--server-host")?;
    let server_port: Option<u16> = args.opt_value_from_str("--server-port")?;
    let baud_rate: Option<u32> = args.opt_value_from_str("--baud")?;
    let serial_path: String = args.free_from_str()?;

    let mut config = SerialTcpClientConfig::new(serial_path);
    if let Some(host) = server_host {
        config.server_host = host;
    }
    if let Some(port) = server_port {
        config.server_port = port;
    }
    if let Some(baud) = baud_rate {
        config.baud_rate = baud;
    }

    finish_args(args)?;
    SerialTcpClient::new(config).run().await?;
    Ok(())
}

async fn relay_local(mut args: pico_args::Arguments) -> Result<()> {
    let protocol = parse_protocol(&mut args)?;
    let baud_rate: u32 = args
        .opt_value_from_str("--baud")?
        .unwrap_or(DEFAULT_BAUD_RATE);
    let gb1_path: String = args.free_from_str()?;
    let gb2_path: String = args.free_from_str()?;
    finish_args(args)?;

    let config = LinkServerConfig::default();
    let mut client1 = SerialTcpClientConfig::new(gb1_path);
    client1.server_port = config.port;
    client1.baud_rate = baud_rate;
    let mut client2 = SerialTcpClientConfig::new(gb2_path);
    client2.server_port = config.port;
    client2.baud_rate = baud_rate;

    let server = tokio::spawn(async move {
        LinkServer::with_config(config, protocol).run().await
    });
    let gb1 = tokio::spawn(async move { SerialTcpClient::new(client1).run().await });
    let gb2 = tokio::spawn(async move { SerialTcpClient::new(client2).run().await });

    let (server, gb1, gb2) = tokio::try_join!(server, gb1, gb2)?;
    server?;
    gb1?;
    gb2?;
    Ok(())
}

async fn relay_serial(mut args: pico_args::Arguments) -> Result<()> {
    let protocol = parse_protocol(&mut args)?;
    let baud_rate: u32 = args
        .opt_value_from_str("--baud")?
        .unwrap_or(DEFAULT_BAUD_RATE);
    let gb1_path: String = args.free_from_str()?;
    let gb2_path: String = args.free_from_str()?;
    finish_args(args)?;

    let mut gb1 = SerialLink::open(&gb1_path, baud_rate).await?;
    let mut gb2 = SerialLink::open(&gb2_path, baud_rate).await?;

    RelayBridge::new(protocol.as_ref()).run(&mut gb1, &mut gb2).await?;
    Ok(())
}

async fn bgb_bridge(mut args: pico_args::Arguments) -> Result<()> {
    let mut config = BgbServerConfig::default();
    if let Some(port) = args.opt_value_from_str("--bgb-port")? {
        config.port = port;
    }
    let baud_rate: u32 = args
        .opt_value_from_str("--baud")?
        .unwrap_or(DEFAULT_BAUD_RATE);
    let serial_path: String = args.free_from_str()?;

    finish_args(args)?;
    let link = SerialLink::open(&serial_path, baud_rate).await?;
    BgbLinkServer::with_config(config)
        .run(CableForwarder::new(link))
        .await?;
    Ok(())
}

async fn trade(mut args: pico_args::Arguments) -> Result<()> {
    let trainer_file: Option<PathBuf> = args.opt_value_from_str("--trainer")?;
    let trainer = load_trainer(trainer_file)?;
    info!(
        "Offering trainer {} with {} party member(s)",
        trainer.name(),
        trainer.party().len()
    );

    match args.subcommand()?.as_deref() {
        Some("bgb") => {
            let mut config = BgbServerConfig::default();
            if let Some(port) = args.opt_value_from_str("--port")? {
                config.port = port;
            }

            finish_args(args)?;
            BgbLinkServer::with_config(config)
                .run(TradePartner::new(&trainer))
                .await?;
        }
        Some("serial") => {
            let baud_rate: u32 = args
                .opt_value_from_str("--baud")?
                .unwrap_or(DEFAULT_BAUD_RATE);
            let serial_path: String = args.free_from_str()?;

            finish_args(args)?;
            let mut link = SerialLink::open(&serial_path, baud_rate).await?;
            let mut partner = TradePartner::as_master(&trainer);
            run_as_master(&mut partner, &mut link).await?;
        }
        _ => bail!("trade requires a connection type: bgb or serial"),
    }
    Ok(())
}

fn load_trainer(path: Option<PathBuf>) -> Result<TrainerRecord> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(&path)?;
            let config: TrainerConfig = serde_json::from_str(&contents)?;
            Ok(TrainerRecord::try_from(config)?)
        }
        None => {
            // Default offer: a single Mew
            let mut trainer = TrainerRecord::new("MATT")?;
            trainer.add_party_member(PokemonRecord::new(0x15, "MEW")?)?;
            Ok(trainer)
        }
    }
}

fn finish_args(args: pico_args::Arguments) -> Result<()> {
    let remaining = args.finish();
    if !remaining.is_empty() {
        bail!("Unused arguments: {:?}", remaining);
    }
    Ok(())
}
