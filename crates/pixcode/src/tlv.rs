//! Tag-length-value fields as used by EMV-QR payloads.
//!
//! Every field is a two-digit tag, a two-digit zero-padded length and the
//! value itself. Lengths count characters, so a value holds at most 99.
//! Template fields (merchant account information, additional data) carry
//! further TLV fields inside their value.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// Largest value a two-digit length prefix can describe.
pub const MAX_VALUE_LEN: usize = 99;

/// Well-known EMV-QR and PIX tags.
pub mod tags {
    /// Payload format indicator.
    pub const PAYLOAD_FORMAT: &str = "00";
    /// Merchant account information template for PIX.
    pub const MERCHANT_ACCOUNT: &str = "26";
    /// Merchant category code.
    pub const MERCHANT_CATEGORY: &str = "52";
    /// Transaction currency (ISO-4217 numeric).
    pub const CURRENCY: &str = "53";
    /// Transaction amount.
    pub const AMOUNT: &str = "54";
    /// Country code.
    pub const COUNTRY: &str = "58";
    /// Merchant name.
    pub const MERCHANT_NAME: &str = "59";
    /// Merchant city.
    pub const MERCHANT_CITY: &str = "60";
    /// Additional data field template.
    pub const ADDITIONAL_DATA: &str = "62";
    /// CRC16 checksum.
    pub const CRC: &str = "63";

    /// Globally unique identifier inside the merchant account template.
    pub const GUI: &str = "00";
    /// PIX key inside the merchant account template.
    pub const PIX_KEY: &str = "01";
    /// Reference label inside the additional data template.
    pub const REFERENCE_LABEL: &str = "05";
}

/// A single decoded TLV field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Two-digit tag.
    pub tag: String,
    /// Raw value, still serialized for template fields.
    pub value: String,
}

impl Field {
    /// Create a field, checking the tag and value length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTag`] or [`Error::ValueTooLong`].
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        let value = value.into();
        check(&tag, &value)?;
        Ok(Self { tag, value })
    }

    /// Serialize this field back to its TLV form.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}{:02}{}", self.tag, self.value.chars().count(), self.value)
    }

    /// Whether this tag is a template holding nested fields.
    ///
    /// Covers the merchant account range (26-51), the additional data
    /// template (62) and the unreserved templates (80-99).
    #[must_use]
    pub fn is_template(&self) -> bool {
        matches!(self.tag.parse::<u8>(), Ok(26..=51 | 62 | 80..=99))
    }

    /// Parse the value of a template field as nested TLV.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedPayload`] if the value is not valid TLV.
    pub fn children(&self) -> Result<Vec<Field>> {
        parse_fields(&self.value)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn check(tag: &str, value: &str) -> Result<usize> {
    if tag.len() != 2 || !tag.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidTag {
            tag: tag.to_string(),
        });
    }
    let length = value.chars().count();
    if length > MAX_VALUE_LEN {
        return Err(Error::ValueTooLong {
            tag: tag.to_string(),
            length,
        });
    }
    Ok(length)
}

/// Encode a single field as `tag` + two-digit length + `value`.
///
/// # Errors
///
/// Returns [`Error::InvalidTag`] if `tag` is not two ASCII digits and
/// [`Error::ValueTooLong`] if `value` is longer than 99 characters.
pub fn encode_field(tag: &str, value: &str) -> Result<String> {
    let mut out = String::new();
    write_field(&mut out, tag, value)?;
    Ok(out)
}

/// Append an encoded field to `out`.
///
/// Nothing is written if the field is rejected.
///
/// # Errors
///
/// Same as [`encode_field`].
pub fn write_field(out: &mut String, tag: &str, value: &str) -> Result<()> {
    let length = check(tag, value)?;
    out.reserve(4 + value.len());
    out.push_str(tag);
    out.push_str(&format!("{length:02}"));
    out.push_str(value);
    Ok(())
}

/// Walk `input` as a flat sequence of TLV fields.
///
/// # Errors
///
/// Returns [`Error::MalformedPayload`] when a tag or length is not two
/// digits, or when a value runs past the end of the input.
pub fn parse_fields(input: &str) -> Result<Vec<Field>> {
    let chars: Vec<char> = input.chars().collect();
    let mut fields = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let tag = read_pair(&chars, pos, "tag")?;
        let length = read_pair(&chars, pos + 2, "length")?
            .bytes()
            .fold(0usize, |acc, b| acc * 10 + usize::from(b - b'0'));

        let start = pos + 4;
        let end = start + length;
        if end > chars.len() {
            return Err(Error::malformed(
                start,
                format!(
                    "value for tag {tag} needs {length} characters but only {} remain",
                    chars.len() - start
                ),
            ));
        }

        fields.push(Field {
            tag,
            value: chars[start..end].iter().collect(),
        });
        pos = end;
    }

    Ok(fields)
}

fn read_pair(chars: &[char], pos: usize, what: &str) -> Result<String> {
    match chars.get(pos..pos + 2) {
        Some(pair) if pair.iter().all(char::is_ascii_digit) => Ok(pair.iter().collect()),
        Some(_) => Err(Error::malformed(pos, format!("{what} is not two digits"))),
        None => Err(Error::malformed(pos, format!("truncated {what}"))),
    }
}
