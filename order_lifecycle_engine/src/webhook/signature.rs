use std::{fmt::Display, io, str::FromStr};

use hmac::{Hmac, Mac};
use log::*;
use olc_common::Secret;
use serde::{
    de::{MapAccess, Visitor},
    Deserialize,
    Deserializer,
    Serialize,
};
use serde_json::{ser::Formatter, value::RawValue};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Webhook-Signature";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("No webhook signature was provided")]
    MissingSignature,
    #[error("Invalid webhook signature")]
    InvalidSignature,
    #[error("Could not extract the signed fields from the payload. {0}")]
    MalformedPayload(String),
    #[error("The webhook secret cannot be used as an HMAC key. {0}")]
    InvalidKey(String),
}

//--------------------------------------     SignatureMode     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureMode {
    /// HMAC over the four whitelisted fields of the body, re-serialized in a fixed order.
    #[default]
    Canonical,
    /// HMAC over the entire, unmodified body.
    Raw,
}

impl Display for SignatureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureMode::Canonical => write!(f, "canonical"),
            SignatureMode::Raw => write!(f, "raw"),
        }
    }
}

impl FromStr for SignatureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "canonical" => Ok(Self::Canonical),
            "raw" => Ok(Self::Raw),
            _ => Err(format!("Invalid signature mode: {s}. Expected 'canonical' or 'raw'")),
        }
    }
}

//--------------------------------------    CanonicalPayload   ---------------------------------------------------------
/// The only fields of a shipping event covered by a canonical signature. Field order here is the signing order.
///
/// Every other field in the body, including `status` and `details`, is discarded before signing. Missing fields
/// take their zero value.
///
/// Signers in the wild decode and re-encode these fields with Go's `encoding/json`, so [`CanonicalPayload::from_body`]
/// and [`CanonicalPayload::to_bytes`] follow its rules rather than serde's:
/// * keys match the field names case-insensitively, and the last matching key in the document wins;
/// * a `null` value leaves the field as it was, and a body of just `null` gives four empty fields;
/// * a string field must hold a string and `timestamp` must be an integer literal that fits in an `i64`;
/// * `<`, `>`, `&`, U+2028 and U+2029 are written as `\u` escapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalPayload {
    pub shipment_id: String,
    pub order_id: String,
    pub event_type: String,
    pub timestamp: i64,
}

impl CanonicalPayload {
    pub fn from_body(body: &[u8]) -> Result<Self, SignatureError> {
        let entries: Option<JsonEntries> = serde_json::from_slice(body).map_err(malformed)?;
        let mut payload = Self::default();
        for (key, value) in entries.map(|e| e.0).unwrap_or_default() {
            let literal = value.get().trim();
            if literal == "null" {
                continue;
            }
            match fold_key(&key).as_str() {
                "SHIPMENT_ID" => payload.shipment_id = string_field(&key, literal)?,
                "ORDER_ID" => payload.order_id = string_field(&key, literal)?,
                "EVENT_TYPE" => payload.event_type = string_field(&key, literal)?,
                "TIMESTAMP" => payload.timestamp = integer_field(&key, literal)?,
                _ => {},
            }
        }
        Ok(payload)
    }

    /// The canonical byte sequence: compact JSON of the four fields, in declaration order.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SignatureError> {
        let mut buf = Vec::with_capacity(128);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, GoCompatibleFormatter);
        self.serialize(&mut serializer).map_err(malformed)?;
        Ok(buf)
    }
}

fn malformed<E: Display>(e: E) -> SignatureError {
    SignatureError::MalformedPayload(e.to_string())
}

fn string_field(key: &str, literal: &str) -> Result<String, SignatureError> {
    if !literal.starts_with('"') {
        return Err(SignatureError::MalformedPayload(format!("{key} must be a string, not {literal}")));
    }
    serde_json::from_str(literal).map_err(malformed)
}

/// Only plain integer literals are accepted, so `1.0`, `1e3` and `"1"` are rejected just as Go rejects them for an
/// `int64` field.
fn integer_field(key: &str, literal: &str) -> Result<i64, SignatureError> {
    literal
        .parse::<i64>()
        .map_err(|_| SignatureError::MalformedPayload(format!("{key} must be an integer, not {literal}")))
}

/// Folds a key the way Go's `encoding/json` does before comparing it with a field name. Besides ASCII case, four
/// non-ASCII letters fold onto the ASCII letters used in the field names.
fn fold_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '\u{017F}' => 'S',
            '\u{212A}' => 'K',
            '\u{0130}' | '\u{0131}' => 'I',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// The members of a JSON object in document order, duplicates included.
struct JsonEntries(Vec<(String, Box<RawValue>)>);

impl<'de> Deserialize<'de> for JsonEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = JsonEntries;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(8));
                while let Some(entry) = map.next_entry::<String, Box<RawValue>>()? {
                    entries.push(entry);
                }
                Ok(JsonEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Compact JSON with the extra string escapes `json.Marshal` applies.
struct GoCompatibleFormatter;

impl Formatter for GoCompatibleFormatter {
    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            let escaped = match c {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

//--------------------------------------    WebhookVerifier    ---------------------------------------------------------
/// Signs and verifies webhook bodies with HMAC-SHA256 under a shared secret. Signatures are lowercase hex.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Secret<String>,
}

impl WebhookVerifier {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    fn hmac_hex(&self, data: &[u8]) -> Result<String, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.reveal().as_bytes())
            .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
        mac.update(data);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Extracts the canonical byte sequence that a canonical-mode signature covers.
    pub fn canonical_bytes(body: &[u8]) -> Result<Vec<u8>, SignatureError> {
        let canonical = CanonicalPayload::from_body(body)?.to_bytes()?;
        debug!("🪝️ Canonical payload for HMAC: {}", String::from_utf8_lossy(&canonical));
        Ok(canonical)
    }

    pub fn sign_canonical(&self, body: &[u8]) -> Result<String, SignatureError> {
        let canonical = Self::canonical_bytes(body)?;
        self.hmac_hex(&canonical)
    }

    pub fn sign_raw(&self, body: &[u8]) -> Result<String, SignatureError> {
        self.hmac_hex(body)
    }

    pub fn sign(&self, mode: SignatureMode, body: &[u8]) -> Result<String, SignatureError> {
        match mode {
            SignatureMode::Canonical => self.sign_canonical(body),
            SignatureMode::Raw => self.sign_raw(body),
        }
    }

    /// Verifies a canonical-mode signature. A body that is not a JSON object with the expected field types fails
    /// verification.
    pub fn verify_canonical(&self, body: &[u8], signature: &str) -> Result<(), SignatureError> {
        if signature.is_empty() {
            return Err(SignatureError::MissingSignature);
        }
        let computed = self.sign_canonical(body).map_err(|e| {
            warn!("🪝️ Could not canonicalize webhook payload. {e}");
            e
        })?;
        compare(&computed, signature)
    }

    pub fn verify_raw(&self, body: &[u8], signature: &str) -> Result<(), SignatureError> {
        if signature.is_empty() {
            return Err(SignatureError::MissingSignature);
        }
        let computed = self.sign_raw(body)?;
        compare(&computed, signature)
    }

    pub fn verify(&self, mode: SignatureMode, body: &[u8], signature: &str) -> Result<(), SignatureError> {
        match mode {
            SignatureMode::Canonical => self.verify_canonical(body, signature),
            SignatureMode::Raw => self.verify_raw(body, signature),
        }
    }
}

/// Plain string equality over the hex digests.
fn compare(computed: &str, provided: &str) -> Result<(), SignatureError> {
    trace!("🪝️ Computed HMAC: {computed}");
    trace!("🪝️ Provided HMAC: {provided}");
    if computed == provided {
        Ok(())
    } else {
        Err(SignatureError::InvalidSignature)
    }
}
