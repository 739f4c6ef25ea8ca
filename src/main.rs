use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;
use udpscope::config::{self, Descriptor};
use udpscope::telemetry::{init_logging, DecodeStats, LogConfig};
use udpscope::{ParsedPacket, PseudoHeaderInput};

#[derive(Parser)]
#[command(name = "udpscope")]
#[command(about = "Decode UDP datagrams and verify their checksums")]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log format: pretty, compact, json
    #[arg(long, global = true, default_value = "pretty")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a single datagram
    Decode {
        /// The datagram as hex (whitespace is ignored)
        hex: Option<String>,

        /// Read the hex from a file instead
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Descriptor TOML carrying the pseudo-header context
        #[arg(short, long)]
        descriptor: Option<PathBuf>,

        /// Pseudo-header source address
        #[arg(long)]
        source_ip: Option<IpAddr>,

        /// Pseudo-header destination address
        #[arg(long)]
        destination_ip: Option<IpAddr>,

        /// Pseudo-header protocol number
        #[arg(long, default_value_t = udpscope::protocol::udp::PROTOCOL_NUMBER)]
        protocol: u8,

        /// Pseudo-header length override
        #[arg(long)]
        length: Option<u16>,
    },
    /// Decode a file of datagrams, one hex line each
    Batch {
        /// Input file; one hex datagram per line, '#' starts a comment
        input: PathBuf,

        /// Descriptor TOML shared by every line
        #[arg(short, long)]
        descriptor: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // RUST_LOG takes priority over the flags
    init_logging(Some(&LogConfig {
        level: cli.log_level.clone(),
        format: cli.log_format.clone(),
    }));

    match cli.command {
        Commands::Decode {
            hex,
            file,
            descriptor,
            source_ip,
            destination_ip,
            protocol,
            length,
        } => {
            if let Err(e) = cmd_decode(
                hex,
                file,
                descriptor,
                source_ip,
                destination_ip,
                protocol,
                length,
            ) {
                eprintln!("[ERROR] {}", e);
                std::process::exit(1);
            }
        }
        Commands::Batch { input, descriptor } => {
            if let Err(e) = cmd_batch(&input, &descriptor) {
                eprintln!("[ERROR] {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn cmd_decode(
    hex: Option<String>,
    file: Option<PathBuf>,
    descriptor_path: Option<PathBuf>,
    source_ip: Option<IpAddr>,
    destination_ip: Option<IpAddr>,
    protocol: u8,
    length: Option<u16>,
) -> Result<(), String> {
    let raw = read_datagram(hex, file)?;
    let descriptor =
        resolve_descriptor(descriptor_path, source_ip, destination_ip, protocol, length)?;

    let packet = decode_with(&raw, &descriptor).map_err(|e| e.to_string())?;
    print_packet(&packet);
    Ok(())
}

fn cmd_batch(input: &PathBuf, descriptor_path: &PathBuf) -> Result<(), String> {
    let descriptor =
        config::load(descriptor_path).map_err(|e| format!("Failed to load descriptor: {}", e))?;
    let content = std::fs::read_to_string(input)
        .map_err(|e| format!("Failed to read {}: {}", input.display(), e))?;

    let stats = DecodeStats::new();

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let raw = match parse_hex(line) {
            Ok(raw) => raw,
            Err(e) => {
                println!("line {}: {}", lineno + 1, e);
                stats.record_error();
                continue;
            }
        };

        match decode_with(&raw, &descriptor) {
            Ok(packet) => {
                let verdict = if packet.checksum_valid {
                    "ok"
                } else {
                    "checksum mismatch"
                };
                println!(
                    "line {}: {} -> {}, length {}, {}",
                    lineno + 1,
                    packet.header.source_port,
                    packet.header.destination_port,
                    packet.header.length,
                    verdict
                );
                stats.record_decoded(packet.payload.len(), packet.checksum_valid);
            }
            Err(e) => {
                println!("line {}: {}", lineno + 1, e);
                stats.record_error();
            }
        }
    }

    println!();
    for (name, value) in stats.export() {
        println!("{}: {}", name, value);
    }
    Ok(())
}

/// Decode one datagram against a descriptor. The pseudo-header length
/// defaults to the datagram's declared length.
fn decode_with<'a>(raw: &'a [u8], descriptor: &Descriptor) -> udpscope::Result<ParsedPacket<'a>> {
    let source = descriptor.source_octets();
    let destination = descriptor.destination_octets();
    let input = PseudoHeaderInput {
        source_ip: &source,
        destination_ip: &destination,
        protocol: descriptor.protocol,
        length: descriptor.length.unwrap_or_else(|| declared_length(raw)),
    };
    udpscope::parse(raw, &input)
}

fn declared_length(raw: &[u8]) -> u16 {
    if raw.len() >= 6 {
        u16::from_be_bytes([raw[4], raw[5]])
    } else {
        // Unused: the header parse rejects the buffer first
        0
    }
}

fn read_datagram(hex: Option<String>, file: Option<PathBuf>) -> Result<Vec<u8>, String> {
    let text = match (hex, file) {
        (Some(hex), None) => hex,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?,
        (Some(_), Some(_)) => {
            return Err("Pass the datagram as an argument or with --file, not both".to_string())
        }
        (None, None) => return Err("No datagram: pass a hex string or --file".to_string()),
    };
    parse_hex(&text)
}

fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(cleaned).map_err(|e| format!("Invalid hex input: {}", e))
}

fn resolve_descriptor(
    path: Option<PathBuf>,
    source_ip: Option<IpAddr>,
    destination_ip: Option<IpAddr>,
    protocol: u8,
    length: Option<u16>,
) -> Result<Descriptor, String> {
    if let Some(path) = path {
        return config::load(&path).map_err(|e| format!("Failed to load descriptor: {}", e));
    }

    let (source_ip, destination_ip) = match (source_ip, destination_ip) {
        (Some(source), Some(destination)) => (source, destination),
        _ => {
            return Err(
                "Pseudo-header context missing: pass --descriptor or both --source-ip and --destination-ip"
                    .to_string(),
            )
        }
    };

    let descriptor = Descriptor {
        source_ip,
        destination_ip,
        protocol,
        length,
    };
    descriptor.validate().map_err(|e| e.to_string())?;
    Ok(descriptor)
}

fn print_packet(packet: &ParsedPacket<'_>) {
    let verdict = if packet.checksum_valid {
        "valid"
    } else {
        "MISMATCH"
    };

    println!("protocol:          {}", packet.protocol);
    println!("source port:       {}", packet.header.source_port);
    println!("destination port:  {}", packet.header.destination_port);
    println!("length:            {}", packet.header.length);
    println!(
        "checksum:          {:#06x} ({})",
        packet.header.checksum, verdict
    );
    println!(
        "pseudo-header:     {} {} -> {}, protocol {}, length {}",
        packet.pseudo_header.family(),
        packet.pseudo_header.source_ip(),
        packet.pseudo_header.destination_ip(),
        packet.pseudo_header.protocol(),
        packet.pseudo_header.length()
    );
    println!("payload:           {} bytes", packet.payload.len());
    if !packet.payload.is_empty() {
        println!("  {}", hex::encode(packet.payload));
    }
}
