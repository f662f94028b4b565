//! Merchant identity that receives PIX payments.
//!
//! The identity is supplied through configuration. It is validated once when
//! configuration loads so payload assembly cannot fail later on an oversized
//! or non-ASCII field.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::payload::PixPayload;

/// Reference label used when a payment is not tied to an order.
pub const DEFAULT_REFERENCE_LABEL: &str = "***";

/// Longest merchant name EMV-QR readers are expected to display.
pub const CONVENTIONAL_NAME_LEN: usize = 25;

/// Longest merchant city EMV-QR readers are expected to display.
pub const CONVENTIONAL_CITY_LEN: usize = 15;

/// The receiving side of a PIX payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    /// Registered PIX key (CPF, CNPJ, phone, e-mail or random key).
    ///
    /// Unquoted digit-only keys in TOML arrive as numbers. Quote keys with
    /// leading zeros so they are kept as text.
    #[serde(deserialize_with = "key_from_text_or_number")]
    pub pix_key: String,
    /// Merchant name shown by the payer's banking app.
    pub name: String,
    /// Merchant city.
    pub city: String,
    /// Reference label placed in the additional data template.
    #[serde(default = "default_reference_label")]
    pub reference_label: String,
}

fn default_reference_label() -> String {
    DEFAULT_REFERENCE_LABEL.to_string()
}

fn key_from_text_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawKey {
        Text(String),
        Number(u64),
    }

    Ok(match RawKey::deserialize(deserializer)? {
        RawKey::Text(key) => key,
        RawKey::Number(key) => key.to_string(),
    })
}

impl Merchant {
    /// Create a merchant with the default reference label.
    #[must_use]
    pub fn new(
        pix_key: impl Into<String>,
        name: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            pix_key: pix_key.into(),
            name: name.into(),
            city: city.into(),
            reference_label: default_reference_label(),
        }
    }

    /// Replace the reference label.
    #[must_use]
    pub fn with_reference_label(mut self, label: impl Into<String>) -> Self {
        self.reference_label = label.into();
        self
    }

    /// Classify the PIX key.
    #[must_use]
    pub fn key_kind(&self) -> PixKeyKind {
        PixKeyKind::classify(&self.pix_key)
    }

    /// Validate the identity.
    ///
    /// Every field must be non-empty ASCII and the identity must assemble
    /// into a payload. Names and cities longer than the EMV-QR display
    /// convention are accepted with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] for empty or non-ASCII fields, or
    /// the encoder error if a field does not fit its length prefix.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("pix_key", &self.pix_key),
            ("name", &self.name),
            ("city", &self.city),
            ("reference_label", &self.reference_label),
        ] {
            if value.trim().is_empty() {
                return Err(Error::config_validation(format!(
                    "merchant.{name} must not be empty"
                )));
            }
            if !value.is_ascii() {
                return Err(Error::config_validation(format!(
                    "merchant.{name} must be ASCII (got {value:?})"
                )));
            }
        }

        if self.name.chars().count() > CONVENTIONAL_NAME_LEN {
            warn!(
                merchant_name = %self.name,
                limit = CONVENTIONAL_NAME_LEN,
                "Merchant name is longer than most readers display"
            );
        }
        if self.city.chars().count() > CONVENTIONAL_CITY_LEN {
            warn!(
                merchant_city = %self.city,
                limit = CONVENTIONAL_CITY_LEN,
                "Merchant city is longer than most readers display"
            );
        }

        let kind = self.key_kind();
        if kind == PixKeyKind::Unknown {
            warn!(key = %self.pix_key, "PIX key does not look like any known key type");
        } else {
            debug!(%kind, "Classified PIX key");
        }

        PixPayload::build(self, None).map(|_| ())
    }
}

/// The kind of PIX key a merchant registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PixKeyKind {
    /// Individual taxpayer number (11 digits).
    Cpf,
    /// Company taxpayer number (14 digits).
    Cnpj,
    /// Brazilian phone number in `+55` international form.
    Phone,
    /// E-mail address.
    Email,
    /// Random key (UUID).
    Evp,
    /// Anything else.
    Unknown,
}

struct KeyPatterns {
    phone: Regex,
    email: Regex,
    evp: Regex,
}

fn key_patterns() -> &'static KeyPatterns {
    static PATTERNS: OnceLock<KeyPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| KeyPatterns {
        phone: Regex::new(r"^\+55\d{10,11}$").expect("phone pattern is valid"),
        email: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"),
        evp: Regex::new(
            r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$",
        )
        .expect("evp pattern is valid"),
    })
}

impl PixKeyKind {
    /// Classify a raw PIX key.
    #[must_use]
    pub fn classify(key: &str) -> Self {
        let patterns = key_patterns();
        let all_digits = !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit());

        if all_digits && key.len() == 11 {
            Self::Cpf
        } else if all_digits && key.len() == 14 {
            Self::Cnpj
        } else if patterns.phone.is_match(key) {
            Self::Phone
        } else if patterns.evp.is_match(key) {
            Self::Evp
        } else if patterns.email.is_match(key) {
            Self::Email
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for PixKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpf => write!(f, "cpf"),
            Self::Cnpj => write!(f, "cnpj"),
            Self::Phone => write!(f, "phone"),
            Self::Email => write!(f, "email"),
            Self::Evp => write!(f, "evp"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
