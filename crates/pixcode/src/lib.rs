//! `pixcode` - PIX BR-Code payload encoder
//!
//! This library assembles EMV-QR merchant-presented payloads for the
//! Brazilian PIX instant-payment system, checks their CRC16 checksum and
//! walks their TLV structure.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod clipboard;
pub mod config;
pub mod crc;
pub mod error;
pub mod logging;
pub mod merchant;
pub mod payload;
pub mod tlv;

pub use clipboard::{ClipboardSink, SystemClipboard};
pub use config::Config;
pub use crc::{crc16, crc16_hex};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use merchant::{Merchant, PixKeyKind};
pub use payload::{decode, verify, Amount, DecodedPayload, PixPayload};
pub use tlv::{encode_field, parse_fields, Field};
