//! camlite - MQTT 3.1.1 subset broker for camera image collection.

use log::{error, info};

use camlite_broker::{Broker, BrokerEvent, Config};

struct Args {
    config_path: String,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = "camlite.toml".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--config" => {
                if i + 1 < args.len() {
                    config_path = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: -c requires a file path");
                    std::process::exit(1);
                }
            }
            "-h" | "--help" => {
                println!("camlite - MQTT 3.1.1 subset broker for camera image collection");
                println!();
                println!("Usage: camlite [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <FILE>     Config file path (default: camlite.toml)");
                println!("  -h, --help              Show this help message");
                println!();
                println!("Configuration:");
                println!("  Config file uses TOML format. All settings can be overridden");
                println!("  with environment variables using CAMLITE__ prefix:");
                println!();
                println!("  CAMLITE__SERVER__BIND=0.0.0.0:1884");
                println!("  CAMLITE__LIMITS__MAX_PACKET_SIZE=2097152");
                println!("  CAMLITE__IMAGE__TOPIC=siot/img");
                println!("  CAMLITE__LOG__LEVEL=debug");
                std::process::exit(0);
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                eprintln!("Use --help for usage information");
                std::process::exit(1);
            }
        }
    }

    Args { config_path }
}

fn main() {
    let args = parse_args();

    let config = match Config::load(&args.config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log.level))
        .init();

    info!("Loaded configuration from {}", args.config_path);

    let (_handle, events) = match Broker::start(config) {
        Ok(started) => started,
        Err(e) => {
            error!("Failed to start broker: {}", e);
            std::process::exit(1);
        }
    };

    // The standalone binary's consumer is the log: drain the event
    // channel until the broker goes away. Library users attach their own
    // consumer to the receiver instead.
    for event in events {
        match event {
            BrokerEvent::ClientConnected { client_id } => {
                info!("event: client {} connected", client_id);
            }
            BrokerEvent::ClientDisconnected { client_id } => {
                info!("event: client {} disconnected", client_id);
            }
            BrokerEvent::MessageReceived {
                topic,
                payload,
                client_id,
            } => {
                info!(
                    "event: message on {:?} from {} ({} bytes)",
                    topic,
                    client_id,
                    payload.len()
                );
            }
            BrokerEvent::ImageReceived {
                client_id,
                format,
                bytes,
            } => {
                info!(
                    "event: {} image from {} ({} bytes)",
                    format,
                    client_id,
                    bytes.len()
                );
            }
        }
    }
}
