// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! abus-monitor - Listen to and send Abus socket records
//!
//! # Usage
//!
//! ```bash
//! # Print every socket 5 record (one bit) and socket 22 record
//! abus-monitor listen --shape 5:1,0,0,0 --shape 22:0,2,0,3
//!
//! # Shapes from a configuration file, JSON output
//! abus-monitor listen --config abus.toml --json
//!
//! # Send one record
//! abus-monitor send --id 5 --sender 8266 --bit true
//!
//! # Write an example configuration
//! abus-monitor gen-config --output abus.toml
//! ```

use abus::{AbusConfig, AbusTransport, Endpoint, Record, Shape, UdpTransport};
use clap::{Parser, Subcommand};
use colored::*;
use log::{info, warn};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Abus socket monitor
#[derive(Parser, Debug)]
#[command(name = "abus-monitor")]
#[command(about = "Listen to, decode and send Abus socket records")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode and print incoming records until Ctrl+C
    Listen {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// UDP port (overrides the configuration)
        #[arg(short, long)]
        port: Option<u16>,

        /// Socket shape "ID:BITS,INTS,LONGS,REALS" (can repeat)
        #[arg(short, long, value_parser = parse_shape)]
        shape: Vec<Shape>,

        /// Print records as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Build and send one record
    Send {
        /// Socket id
        #[arg(long)]
        id: u8,

        /// Sender NAD
        #[arg(long, default_value = "0")]
        sender: u32,

        /// Boolean field (can repeat; true/false/1/0)
        #[arg(long = "bit", value_parser = clap::builder::BoolishValueParser::new())]
        bits: Vec<bool>,

        /// i16 field (can repeat)
        #[arg(long = "int", allow_hyphen_values = true)]
        ints: Vec<i16>,

        /// i32 field (can repeat)
        #[arg(long = "long", allow_hyphen_values = true)]
        longs: Vec<i32>,

        /// f32 field (can repeat)
        #[arg(long = "real", allow_hyphen_values = true)]
        reals: Vec<f32>,

        /// Destination address
        #[arg(short, long, default_value = "255.255.255.255")]
        broadcast: Ipv4Addr,

        /// Destination UDP port
        #[arg(short, long, default_value_t = abus::DEFAULT_PORT)]
        port: u16,
    },

    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "abus.toml")]
        output: PathBuf,
    },
}

fn parse_shape(s: &str) -> Result<Shape, String> {
    let (id, counts) = s
        .split_once(':')
        .ok_or_else(|| format!("expected ID:BITS,INTS,LONGS,REALS, got '{}'", s))?;
    let socket_id: u8 = id
        .trim()
        .parse()
        .map_err(|e| format!("invalid socket id '{}': {}", id, e))?;
    if socket_id == 0 {
        return Err("socket id must be 1..255".into());
    }

    let counts = counts
        .split(',')
        .map(|c| {
            c.trim()
                .parse::<u8>()
                .map_err(|e| format!("invalid count '{}': {}", c, e))
        })
        .collect::<Result<Vec<u8>, String>>()?;
    match counts[..] {
        [bits, ints, longs, reals] => Ok(Shape::new(socket_id, bits, ints, longs, reals)),
        _ => Err(format!("expected 4 counts, got {}", counts.len())),
    }
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .format_target(false)
        .init();

    let result = match args.command {
        Commands::Listen {
            config,
            port,
            shape,
            json,
        } => cmd_listen(config, port, shape, json),
        Commands::Send {
            id,
            sender,
            bits,
            ints,
            longs,
            reals,
            broadcast,
            port,
        } => {
            let mut record = Record::new(id).with_sender(sender);
            bits.into_iter().for_each(|v| record.append_bit(v));
            ints.into_iter().for_each(|v| record.append_int(v));
            longs.into_iter().for_each(|v| record.append_long(v));
            reals.into_iter().for_each(|v| record.append_real(v));
            cmd_send(record, broadcast, port)
        }
        Commands::GenConfig { output } => cmd_gen_config(output),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_listen(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    shapes: Vec<Shape>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => AbusConfig::from_file(path)?,
        None => AbusConfig::default(),
    };
    if let Some(port) = port {
        config = config.with_port(port);
    }
    config.sockets.extend(shapes);
    if config.sockets.is_empty() {
        return Err("no socket shapes given (use --shape or --config)".into());
    }
    config.validate()?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let shapes = config.sockets.clone();
    let mut endpoint = Endpoint::bind(config)?;
    for shape in shapes {
        endpoint.subscribe(shape, move |record: Record| print_record(&record, json))?;
    }

    eprintln!(
        "{} Listening on port {} ({} sockets)",
        ">>>".green().bold(),
        endpoint.transport().port(),
        endpoint.registry().len()
    );

    while running.load(Ordering::SeqCst) {
        if !poll_once(&mut endpoint) {
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    eprintln!();
    eprintln!("{} {}", "Stats:".bold(), endpoint.stats());
    Ok(())
}

/// One receive step; errors (e.g. ICMP port unreachable) are logged and
/// listening continues.
fn poll_once<T: AbusTransport>(endpoint: &mut Endpoint<T>) -> bool {
    match endpoint.poll() {
        Ok(consumed) => consumed,
        Err(e) => {
            warn!("receive failed: {}", e);
            false
        }
    }
}

fn print_record(record: &Record, json: bool) {
    if json {
        match serde_json::to_string(record) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("cannot serialize record: {}", e),
        }
        return;
    }

    let mut fields = Vec::new();
    if !record.bits.is_empty() {
        let bits: String = record
            .bits
            .iter()
            .map(|&b| if b { '1' } else { '0' })
            .collect();
        fields.push(format!("bits={}", bits));
    }
    if !record.ints.is_empty() {
        fields.push(format!("ints={:?}", record.ints));
    }
    if !record.longs.is_empty() {
        fields.push(format!("longs={:?}", record.longs));
    }
    if !record.reals.is_empty() {
        fields.push(format!("reals={:?}", record.reals));
    }

    println!(
        "{} {} {}",
        format!("socket {:>3}", record.socket_id()).cyan().bold(),
        format!("from {:>10}", record.sender).dimmed(),
        fields.join(" ")
    );
}

fn cmd_send(
    record: Record,
    broadcast: Ipv4Addr,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AbusConfig::default()
        .with_port(port)
        .with_broadcast(broadcast);
    let dest = config.destination();
    let mut endpoint = Endpoint::new(config, UdpTransport::bind(0)?)?;

    let len = endpoint.send_record(&record)?;
    info!("sent socket {} ({} bytes) to {}", record.socket_id(), len, dest);
    println!(
        "{} socket {} -> {} ({} bytes)",
        "Sent".green().bold(),
        record.socket_id(),
        dest,
        len
    );
    Ok(())
}

fn cmd_gen_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = AbusConfig {
        own_nad: 8266,
        sockets: vec![Shape::new(5, 1, 0, 0, 0), Shape::new(22, 0, 2, 0, 3)],
        ..AbusConfig::default()
    };
    config.validate()?;

    let toml_str = toml::to_string_pretty(&config)?;

    // Add comments
    let content = format!(
        r#"# Abus Configuration
# Generated by abus-monitor gen-config
#
# Each [[sockets]] entry declares the payload layout of one socket id:
# bit_count booleans, then int_count i16, long_count i32, real_count f32.

{}
"#,
        toml_str
    );

    std::fs::write(&output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}
