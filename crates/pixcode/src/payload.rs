//! PIX BR-Code payload assembly and verification.
//!
//! A payload is an ordered run of TLV fields in EMV-QR merchant-presented
//! mode, closed by a CRC16 field whose checksum covers everything before it,
//! including the `6304` header of the CRC field itself.
//!
//! # Example
//!
//! ```
//! use pixcode::{Amount, Merchant, PixPayload};
//!
//! let merchant = Merchant::new("51708193000170", "INSTITUTO ESCOLA JOVENS", "SAO PAULO");
//! let amount = Amount::parse_lenient("25,00");
//! let payload = PixPayload::build(&merchant, amount).unwrap();
//!
//! assert!(payload.as_str().contains("540525.00"));
//! assert!(pixcode::payload::verify(payload.as_str()).is_ok());
//! ```

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::crc::crc16_hex;
use crate::error::{Error, Result};
use crate::merchant::Merchant;
use crate::tlv::{parse_fields, tags, write_field, Field};

/// Globally unique identifier of the PIX arrangement.
pub const PIX_GUI: &str = "br.gov.bcb.pix";

/// Payload format indicator value.
const FORMAT_INDICATOR: &str = "01";

/// Merchant category code: not informed.
const CATEGORY_NOT_INFORMED: &str = "0000";

/// ISO-4217 numeric code for the Brazilian real.
const CURRENCY_BRL: &str = "986";

const COUNTRY_BR: &str = "BR";

/// Tag and length header of the CRC field.
const CRC_HEADER: &str = "6304";

/// A monetary amount in centavos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct Amount {
    cents: u64,
}

impl Amount {
    /// Create an amount from a number of centavos.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    /// Number of centavos.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.cents
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.cents == 0
    }

    /// Parse user input, treating anything unusable as "no amount".
    ///
    /// Accepts `.` or `,` as the decimal separator and rounds extra decimal
    /// digits half-up to centavos. Empty, malformed, negative, zero and
    /// overflowing input all yield `None`, so the payer types the amount in
    /// their banking app instead of scanning an unusable code.
    #[must_use]
    pub fn parse_lenient(input: &str) -> Option<Self> {
        match Self::parse(input) {
            Ok(amount) if !amount.is_zero() => Some(amount),
            Ok(_) => {
                debug!(input, "Ignoring zero amount");
                None
            }
            Err(reason) => {
                debug!(input, reason, "Ignoring unusable amount");
                None
            }
        }
    }

    fn parse(input: &str) -> std::result::Result<Self, &'static str> {
        let s = input.trim();
        if s.is_empty() {
            return Err("empty");
        }

        let (units, fraction) = match s.find(['.', ',']) {
            Some(i) => (&s[..i], &s[i + 1..]),
            None => (s, ""),
        };
        if units.is_empty() && fraction.is_empty() {
            return Err("no digits");
        }
        if !units.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err("not a decimal number");
        }

        let units: u64 = if units.is_empty() {
            0
        } else {
            units.parse().map_err(|_| "too large")?
        };

        let mut digits = fraction.bytes().map(|b| u64::from(b - b'0'));
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        let round_up = u64::from(digits.next().is_some_and(|d| d >= 5));

        units
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + round_up))
            .map(Self::from_cents)
            .ok_or("too large")
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

/// An assembled PIX payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PixPayload {
    text: String,
}

impl PixPayload {
    /// Assemble the payload for `merchant`, optionally fixing an amount.
    ///
    /// The amount field is written only for amounts above zero. Fields are
    /// emitted in the canonical order expected by PIX readers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueTooLong`] if a merchant field does not fit its
    /// length prefix. [`Merchant::validate`] catches this at startup.
    pub fn build(merchant: &Merchant, amount: Option<Amount>) -> Result<Self> {
        let mut account = String::new();
        write_field(&mut account, tags::GUI, PIX_GUI)?;
        write_field(&mut account, tags::PIX_KEY, &merchant.pix_key)?;

        let mut additional = String::new();
        write_field(
            &mut additional,
            tags::REFERENCE_LABEL,
            &merchant.reference_label,
        )?;

        let mut text = String::with_capacity(160);
        write_field(&mut text, tags::PAYLOAD_FORMAT, FORMAT_INDICATOR)?;
        write_field(&mut text, tags::MERCHANT_ACCOUNT, &account)?;
        write_field(&mut text, tags::MERCHANT_CATEGORY, CATEGORY_NOT_INFORMED)?;
        write_field(&mut text, tags::CURRENCY, CURRENCY_BRL)?;
        if let Some(amount) = amount.filter(|a| !a.is_zero()) {
            write_field(&mut text, tags::AMOUNT, &amount.to_string())?;
        }
        write_field(&mut text, tags::COUNTRY, COUNTRY_BR)?;
        write_field(&mut text, tags::MERCHANT_NAME, &merchant.name)?;
        write_field(&mut text, tags::MERCHANT_CITY, &merchant.city)?;
        write_field(&mut text, tags::ADDITIONAL_DATA, &additional)?;

        text.push_str(CRC_HEADER);
        let crc = crc16_hex(&text);
        text.push_str(&crc);

        debug!(
            len = text.len(),
            amount = ?amount.map(|a| a.to_string()),
            %crc,
            "Assembled PIX payload"
        );
        Ok(Self { text })
    }

    /// The payload text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The trailing four-digit checksum.
    #[must_use]
    pub fn crc(&self) -> &str {
        &self.text[self.text.len() - 4..]
    }

    /// Consume the payload, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for PixPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for PixPayload {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Check the trailing CRC field of a payload.
///
/// # Errors
///
/// Returns [`Error::MalformedPayload`] when the payload is not ASCII or does
/// not end in `6304` plus four uppercase hex digits, and
/// [`Error::ChecksumMismatch`] when the checksum does not match.
pub fn verify(payload: &str) -> Result<()> {
    if let Some(offset) = payload.chars().position(|c| !c.is_ascii()) {
        return Err(Error::malformed(offset, "payload must be ASCII"));
    }
    if payload.len() < CRC_HEADER.len() + 4 {
        return Err(Error::malformed(0, "too short to carry a checksum"));
    }

    let (body, actual) = payload.split_at(payload.len() - 4);
    if !body.ends_with(CRC_HEADER) {
        return Err(Error::malformed(
            body.len() - CRC_HEADER.len(),
            "checksum field 6304 is missing",
        ));
    }
    if !actual
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
    {
        return Err(Error::malformed(
            body.len(),
            "checksum is not four uppercase hex digits",
        ));
    }

    let expected = crc16_hex(body);
    if expected != actual {
        return Err(Error::ChecksumMismatch {
            expected,
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// A top-level field of a decoded payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedField {
    /// Two-digit tag.
    pub tag: String,
    /// Raw value.
    pub value: String,
    /// Nested fields when the tag is a template.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Field>,
}

impl DecodedField {
    fn child(&self, tag: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|f| f.tag == tag)
            .map(|f| f.value.as_str())
    }
}

/// A verified payload broken into its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedPayload {
    /// Top-level fields in payload order, including the CRC field.
    pub fields: Vec<DecodedField>,
}

impl DecodedPayload {
    /// Find a top-level field by tag.
    #[must_use]
    pub fn field(&self, tag: &str) -> Option<&DecodedField> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    fn value(&self, tag: &str) -> Option<&str> {
        self.field(tag).map(|f| f.value.as_str())
    }

    /// The PIX key, if the merchant account template carries the PIX GUI.
    #[must_use]
    pub fn pix_key(&self) -> Option<&str> {
        let account = self.field(tags::MERCHANT_ACCOUNT)?;
        let gui = account.child(tags::GUI)?;
        if !gui.eq_ignore_ascii_case(PIX_GUI) {
            return None;
        }
        account.child(tags::PIX_KEY)
    }

    /// The fixed amount, if any.
    #[must_use]
    pub fn amount(&self) -> Option<Amount> {
        self.value(tags::AMOUNT).and_then(Amount::parse_lenient)
    }

    /// The merchant name.
    #[must_use]
    pub fn merchant_name(&self) -> Option<&str> {
        self.value(tags::MERCHANT_NAME)
    }

    /// The merchant city.
    #[must_use]
    pub fn merchant_city(&self) -> Option<&str> {
        self.value(tags::MERCHANT_CITY)
    }

    /// The reference label from the additional data template.
    #[must_use]
    pub fn reference_label(&self) -> Option<&str> {
        self.field(tags::ADDITIONAL_DATA)?
            .child(tags::REFERENCE_LABEL)
    }

    /// The checksum carried by the payload.
    #[must_use]
    pub fn crc(&self) -> Option<&str> {
        self.value(tags::CRC)
    }

    /// Rebuild the merchant identity encoded in the payload.
    #[must_use]
    pub fn merchant(&self) -> Option<Merchant> {
        let merchant = Merchant::new(
            self.pix_key()?,
            self.merchant_name()?,
            self.merchant_city()?,
        );
        Some(match self.reference_label() {
            Some(label) => merchant.with_reference_label(label),
            None => merchant,
        })
    }
}

/// Verify a payload and break it into fields.
///
/// # Errors
///
/// Returns the errors of [`verify`], or [`Error::MalformedPayload`] when the
/// fields do not walk cleanly up to a final CRC field.
pub fn decode(payload: &str) -> Result<DecodedPayload> {
    verify(payload)?;

    let mut fields = Vec::new();
    for field in parse_fields(payload)? {
        let children = match field.tag.as_str() {
            tags::MERCHANT_ACCOUNT | tags::ADDITIONAL_DATA => field.children()?,
            _ if field.is_template() => field.children().unwrap_or_else(|e| {
                debug!(tag = %field.tag, error = %e, "Keeping opaque template value");
                Vec::new()
            }),
            _ => Vec::new(),
        };
        fields.push(DecodedField {
            tag: field.tag,
            value: field.value,
            children,
        });
    }

    match fields.last() {
        Some(last) if last.tag == tags::CRC && last.value.len() == 4 => {
            Ok(DecodedPayload { fields })
        }
        _ => Err(Error::malformed(
            payload.len() - 8,
            "fields do not end at the checksum field",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::crc16_hex;

    const INSTITUTE_25: &str = "00020126360014br.gov.bcb.pix011451708193000170\
                                520400005303986540525.005802BR5923INSTITUTO ESCOLA JOVENS\
                                6009SAO PAULO62070503***6304D765";

    const INSTITUTE_OPEN: &str = "00020126360014br.gov.bcb.pix011451708193000170\
                                  5204000053039865802BR5923INSTITUTO ESCOLA JOVENS\
                                  6009SAO PAULO62070503***6304006A";

    fn institute() -> Merchant {
        Merchant::new("51708193000170", "INSTITUTO ESCOLA JOVENS", "SAO PAULO")
    }

    #[test]
    fn test_amount_display() {
        assert_eq!(Amount::from_cents(2500).to_string(), "25.00");
        assert_eq!(Amount::from_cents(1050).to_string(), "10.50");
        assert_eq!(Amount::from_cents(7).to_string(), "0.07");
        assert_eq!(Amount::from_cents(0).to_string(), "0.00");
    }

    #[test]
    fn test_parse_lenient_accepts_decimals() {
        assert_eq!(Amount::parse_lenient("25"), Some(Amount::from_cents(2500)));
        assert_eq!(Amount::parse_lenient("10.5"), Some(Amount::from_cents(1050)));
        assert_eq!(Amount::parse_lenient("10,5"), Some(Amount::from_cents(1050)));
        assert_eq!(Amount::parse_lenient(" 3.14 "), Some(Amount::from_cents(314)));
        assert_eq!(Amount::parse_lenient(".5"), Some(Amount::from_cents(50)));
        assert_eq!(Amount::parse_lenient("7."), Some(Amount::from_cents(700)));
    }

    #[test]
    fn test_parse_lenient_rounds_half_up() {
        assert_eq!(Amount::parse_lenient("1.005"), Some(Amount::from_cents(101)));
        assert_eq!(Amount::parse_lenient("1.004"), Some(Amount::from_cents(100)));
        assert_eq!(Amount::parse_lenient("0.999"), Some(Amount::from_cents(100)));
    }

    #[test]
    fn test_parse_lenient_rejects_unusable_input() {
        for input in ["", "   ", "0", "0.00", "-3", "abc", "1.2.3", ".", "1e3", "R$ 10"] {
            assert_eq!(Amount::parse_lenient(input), None, "input {input:?}");
        }
        assert_eq!(Amount::parse_lenient("99999999999999999999999"), None);
    }

    #[test]
    fn test_amount_serializes_as_string() {
        let json = serde_json::to_string(&Amount::from_cents(1050)).unwrap();
        assert_eq!(json, "\"10.50\"");
    }

    #[test]
    fn test_build_with_amount() {
        let payload = PixPayload::build(&institute(), Some(Amount::from_cents(2500))).unwrap();
        assert_eq!(payload.as_str(), INSTITUTE_25);
        assert!(payload.as_str().starts_with("000201260"));
        assert!(payload.as_str().contains("540525.00"));
        assert_eq!(payload.crc(), "D765");
    }

    #[test]
    fn test_build_without_amount() {
        let payload = PixPayload::build(&institute(), None).unwrap();
        assert_eq!(payload.as_str(), INSTITUTE_OPEN);
        assert!(!payload.as_str().contains("5405"));
    }

    #[test]
    fn test_build_zero_amount_omits_field() {
        let zero = PixPayload::build(&institute(), Some(Amount::from_cents(0))).unwrap();
        let none = PixPayload::build(&institute(), None).unwrap();
        assert_eq!(zero, none);
        assert!(decode(zero.as_str()).unwrap().field(tags::AMOUNT).is_none());
    }

    #[test]
    fn test_build_ten_fifty() {
        let payload = PixPayload::build(&institute(), Amount::parse_lenient("10.5")).unwrap();
        assert!(payload.as_str().contains("540510.50"));
        assert_eq!(payload.crc(), "D496");
    }

    #[test]
    fn test_build_reference_example() {
        let merchant = Merchant::new(
            "123e4567-e12b-12d1-a456-426655440000",
            "Fulano de Tal",
            "BRASILIA",
        );
        let payload = PixPayload::build(&merchant, None).unwrap();
        assert_eq!(
            payload.as_str(),
            "00020126580014br.gov.bcb.pix0136123e4567-e12b-12d1-a456-426655440000\
             5204000053039865802BR5913Fulano de Tal6008BRASILIA62070503***63041D3D"
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let amount = Some(Amount::from_cents(12_345));
        let a = PixPayload::build(&institute(), amount).unwrap();
        let b = PixPayload::build(&institute(), amount).unwrap();
        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_build_custom_reference_label() {
        let merchant = institute().with_reference_label("BOLSA2025");
        let payload = PixPayload::build(&merchant, None).unwrap();
        assert!(payload.as_str().contains("62130509BOLSA2025"));
        assert!(verify(payload.as_str()).is_ok());
    }

    #[test]
    fn test_build_rejects_oversized_name() {
        let mut merchant = institute();
        merchant.name = "N".repeat(100);
        let err = PixPayload::build(&merchant, None).unwrap_err();
        assert!(matches!(err, Error::ValueTooLong { .. }));
    }

    #[test]
    fn test_crc_covers_header() {
        let payload = PixPayload::build(&institute(), None).unwrap();
        let text = payload.as_str();
        let (body, crc) = text.split_at(text.len() - 4);
        assert!(body.ends_with("6304"));
        assert_eq!(crc16_hex(body), crc);
    }

    #[test]
    fn test_payload_display_and_into_string() {
        let payload = PixPayload::build(&institute(), None).unwrap();
        assert_eq!(payload.to_string(), INSTITUTE_OPEN);
        assert_eq!(payload.as_ref(), INSTITUTE_OPEN);
        assert_eq!(payload.into_string(), INSTITUTE_OPEN);
    }

    #[test]
    fn test_verify_ok() {
        assert!(verify(INSTITUTE_25).is_ok());
        assert!(verify(INSTITUTE_OPEN).is_ok());
    }

    #[test]
    fn test_verify_detects_tampering() {
        let tampered = INSTITUTE_25.replace("25.00", "95.00");
        let err = verify(&tampered).unwrap_err();
        assert!(err.is_checksum_error());
    }

    #[test]
    fn test_verify_rejects_lowercase_crc() {
        let lower = INSTITUTE_25.replace("6304D765", "6304d765");
        let err = verify(&lower).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));
    }

    #[test]
    fn test_verify_rejects_missing_crc_header() {
        let err = verify("000201ABCD").unwrap_err();
        assert!(err.to_string().contains("6304"));
    }

    #[test]
    fn test_verify_rejects_short_and_non_ascii_input() {
        assert!(matches!(
            verify("6304").unwrap_err(),
            Error::MalformedPayload { offset: 0, .. }
        ));
        assert!(matches!(
            verify("0002\u{E9}16304FFFF").unwrap_err(),
            Error::MalformedPayload { offset: 4, .. }
        ));
    }

    #[test]
    fn test_decode_fields_in_order() {
        let decoded = decode(INSTITUTE_25).unwrap();
        let tags: Vec<&str> = decoded.fields.iter().map(|f| f.tag.as_str()).collect();
        assert_eq!(
            tags,
            vec!["00", "26", "52", "53", "54", "58", "59", "60", "62", "63"]
        );
    }

    #[test]
    fn test_decode_accessors() {
        let decoded = decode(INSTITUTE_25).unwrap();
        assert_eq!(decoded.pix_key(), Some("51708193000170"));
        assert_eq!(decoded.amount(), Some(Amount::from_cents(2500)));
        assert_eq!(decoded.merchant_name(), Some("INSTITUTO ESCOLA JOVENS"));
        assert_eq!(decoded.merchant_city(), Some("SAO PAULO"));
        assert_eq!(decoded.reference_label(), Some("***"));
        assert_eq!(decoded.crc(), Some("D765"));
        assert_eq!(decoded.merchant(), Some(institute()));
    }

    #[test]
    fn test_decode_template_children() {
        let decoded = decode(INSTITUTE_OPEN).unwrap();
        let account = decoded.field("26").unwrap();
        assert_eq!(account.children.len(), 2);
        assert_eq!(account.children[0].value, PIX_GUI);
        assert!(decoded.field("59").unwrap().children.is_empty());
        assert!(decoded.amount().is_none());
    }

    #[test]
    fn test_decode_rejects_bad_checksum() {
        let tampered = INSTITUTE_OPEN.replace("SAO PAULO", "SAO PAULA");
        assert!(decode(&tampered).unwrap_err().is_checksum_error());
    }

    #[test]
    fn test_decode_rejects_misaligned_fields() {
        // Valid checksum over a body whose length prefix swallows the CRC header.
        let mut body = String::from("00020159086304");
        body.push_str(&crc16_hex(&body));
        let err = decode(&body).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));
    }

    #[test]
    fn test_decode_rejects_oversized_crc_field() {
        // Checksum is valid, but the final 63 field spans the trailing 6304 header.
        let mut body = String::from("0002016310AB6304");
        body.push_str(&crc16_hex(&body));
        assert!(verify(&body).is_ok());
        let err = decode(&body).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));
    }

    #[test]
    fn test_decode_keeps_opaque_template_values() {
        let mut body = String::from("0002018004ABCD6304");
        body.push_str(&crc16_hex(&body));
        let decoded = decode(&body).unwrap();
        let opaque = decoded.field("80").unwrap();
        assert_eq!(opaque.value, "ABCD");
        assert!(opaque.children.is_empty());
        assert_eq!(decoded.crc().map(str::len), Some(4));
    }

    #[test]
    fn test_decode_rejects_malformed_merchant_account() {
        let mut body = String::from("0002012604ABCD6304");
        body.push_str(&crc16_hex(&body));
        let err = decode(&body).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));
    }

    #[test]
    fn test_decoded_payload_serializes() {
        let decoded = decode(INSTITUTE_OPEN).unwrap();
        let json = serde_json::to_value(&decoded).unwrap();
        assert_eq!(json["fields"][0]["tag"], "00");
        assert_eq!(json["fields"][1]["children"][1]["value"], "51708193000170");
        assert!(json["fields"][2].get("children").is_none());
    }
}
