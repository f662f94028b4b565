//! `pixcode` - CLI for the PIX payload encoder
//!
//! This binary generates payloads for the configured merchant and checks or
//! decodes payloads produced elsewhere.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};

use pixcode::cli::{Cli, Command, ConfigCommand, DecodeCommand, GenerateCommand, OutputFormat};
use pixcode::clipboard::{copy_to, SystemClipboard};
use pixcode::{crc16_hex, decode, init_logging, verify, Amount, Config, PixPayload};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let config = if cli.command.needs_config() {
        Config::load_from(cli.config.clone()).context("loading configuration")?
    } else {
        Config::default()
    };

    match cli.command {
        Command::Generate(cmd) => handle_generate(&config, &cmd),
        Command::Verify(cmd) => {
            verify(&cmd.payload)?;
            println!("OK");
            Ok(())
        }
        Command::Decode(cmd) => handle_decode(&cmd),
        Command::Crc(cmd) => {
            println!("{}", crc16_hex(&cmd.text));
            Ok(())
        }
        Command::Config(cmd) => handle_config(&config, cli.config, cmd),
    }
}

fn handle_generate(config: &Config, cmd: &GenerateCommand) -> Result<()> {
    let merchant = config.merchant()?;

    let amount = cmd.amount.as_deref().and_then(|raw| {
        let parsed = Amount::parse_lenient(raw);
        if parsed.is_none() {
            warn!(input = raw, "Amount is not a positive number; leaving it to the payer");
        }
        parsed
    });

    let payload = PixPayload::build(merchant, amount)?;

    match cmd.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "payload": payload,
                "amount": amount,
                "crc": payload.crc(),
                "merchant": merchant,
                "key_kind": merchant.key_kind(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{payload}");
            if config.output.show_summary {
                let amount = amount.map_or_else(|| "open".to_string(), |a| a.to_string());
                eprintln!("amount: {amount}  crc: {}", payload.crc());
            }
        }
    }

    if cmd.to_clipboard || config.output.copy_to_clipboard {
        let mut clipboard = SystemClipboard::new().context("opening the clipboard")?;
        if copy_to(&mut clipboard, payload.as_str()).context("copying the payload")? {
            eprintln!("Copied to clipboard.");
        }
    }

    debug!("Generate complete");
    Ok(())
}

fn handle_decode(cmd: &DecodeCommand) -> Result<()> {
    let decoded = decode(&cmd.payload)?;

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&decoded)?),
        OutputFormat::Plain => {
            for field in &decoded.fields {
                println!("{} {:02} {}", field.tag, field.value.chars().count(), field.value);
                for child in &field.children {
                    println!(
                        "  {} {:02} {}",
                        child.tag,
                        child.value.chars().count(),
                        child.value
                    );
                }
            }
            println!();
            println!("PIX key:   {}", decoded.pix_key().unwrap_or("-"));
            println!(
                "Amount:    {}",
                decoded
                    .amount()
                    .map_or_else(|| "open".to_string(), |a| a.to_string())
            );
            println!("Merchant:  {}", decoded.merchant_name().unwrap_or("-"));
            println!("City:      {}", decoded.merchant_city().unwrap_or("-"));
            println!("Reference: {}", decoded.reference_label().unwrap_or("-"));
        }
    }
    Ok(())
}

fn handle_config(
    config: &Config,
    config_path: Option<std::path::PathBuf>,
    cmd: ConfigCommand,
) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Merchant]");
                match &config.merchant {
                    Some(merchant) => {
                        println!(
                            "  PIX key:            {} ({})",
                            merchant.pix_key,
                            merchant.key_kind()
                        );
                        println!("  Name:               {}", merchant.name);
                        println!("  City:               {}", merchant.city);
                        println!("  Reference label:    {}", merchant.reference_label);
                    }
                    None => println!("  (not configured)"),
                }
                println!();
                println!("[Output]");
                println!(
                    "  Copy to clipboard:  {}",
                    config.output.copy_to_clipboard
                );
                println!("  Show summary:       {}", config.output.show_summary);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            let config = Config::load_from(Some(path))?;
            config.merchant()?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
