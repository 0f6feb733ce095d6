//! Ticket wire codec.
//!
//! A ticket is `base64url(header) "." base64url(payload) "." base64url(sig)`
//! with unpadded base64url. The signature covers exactly the transmitted
//! `header.payload` bytes; verification never re-encodes the payload.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use asoc_types::{AuditTicketPayload, ErrorKind, SignedTicket, ValidationResult};

use crate::error::TicketResult;
use crate::key::{Algorithm, TicketKey};

/// `typ` value written into every header.
pub const TICKET_TYPE: &str = "JWT";

/// First segment of a ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketHeader {
    pub alg: Algorithm,
    #[serde(default)]
    pub typ: Option<String>,
}

/// A structurally valid ticket whose signature has not been checked yet.
struct ParsedTicket<'a> {
    signing_input: &'a str,
    header: TicketHeader,
    payload: AuditTicketPayload,
    signature: Vec<u8>,
}

/// Sign `payload` with `key`, using the key's algorithm.
pub fn sign(payload: &AuditTicketPayload, key: &dyn TicketKey) -> TicketResult<SignedTicket> {
    let header = TicketHeader {
        alg: key.algorithm(),
        typ: Some(TICKET_TYPE.to_string()),
    };

    let header_segment = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
    let payload_segment = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload)?);
    let signing_input = format!("{}.{}", header_segment, payload_segment);

    let signature = key.sign(signing_input.as_bytes())?;

    Ok(SignedTicket::new(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature)
    )))
}

/// Verify signature, issuer and expiry against the wall clock.
///
/// Does not evaluate constraints or the embedded kill switch.
pub fn verify(token: &str, key: &dyn TicketKey, expected_issuer: &str) -> ValidationResult {
    verify_at(token, key, expected_issuer, Utc::now())
}

/// [`verify`] with an explicit clock.
pub fn verify_at(
    token: &str,
    key: &dyn TicketKey,
    expected_issuer: &str,
    now: DateTime<Utc>,
) -> ValidationResult {
    // 1. Structure
    let parsed = match parse(token) {
        Ok(parsed) => parsed,
        Err(reason) => {
            tracing::debug!(reason = %reason, "Ticket rejected: malformed");
            return ValidationResult::invalid(ErrorKind::InvalidFormat, reason);
        }
    };

    // 2. Algorithm and signature
    if parsed.header.alg != key.algorithm() {
        tracing::debug!(
            header_alg = %parsed.header.alg,
            expected_alg = %key.algorithm(),
            "Ticket rejected: algorithm mismatch"
        );
        return ValidationResult::invalid(ErrorKind::InvalidSignature, "Invalid signature");
    }
    if !key.verify(parsed.signing_input.as_bytes(), &parsed.signature) {
        tracing::debug!("Ticket rejected: signature mismatch");
        return ValidationResult::invalid(ErrorKind::InvalidSignature, "Invalid signature");
    }

    let payload = parsed.payload;

    // 3. Issuer
    if payload.issuer() != expected_issuer {
        tracing::debug!(
            issuer = %payload.issuer(),
            expected = %expected_issuer,
            "Ticket rejected: issuer mismatch"
        );
        return ValidationResult::invalid(ErrorKind::ValidationFailed, "Invalid issuer");
    }

    // 4. Expiry
    if payload.is_expired_at(now) {
        tracing::debug!(
            agent_id = %payload.subject(),
            expired_at = %payload.expires_at(),
            "Ticket rejected: expired"
        );
        return ValidationResult::invalid(ErrorKind::Expired, "Ticket expired");
    }

    ValidationResult::Valid(payload)
}

/// Decode the payload WITHOUT any cryptographic check.
///
/// For inspection and debugging only. The result must never feed an
/// admission decision: anyone can forge a token that decodes.
pub fn decode_unsafe(token: &str) -> Option<AuditTicketPayload> {
    parse(token).ok().map(|parsed| parsed.payload)
}

fn parse(token: &str) -> Result<ParsedTicket<'_>, String> {
    let token = token.trim();
    let (signing_input, signature_segment) = token
        .rsplit_once('.')
        .ok_or_else(|| "Malformed ticket: expected three segments".to_string())?;
    let (header_segment, payload_segment) = signing_input
        .split_once('.')
        .ok_or_else(|| "Malformed ticket: expected three segments".to_string())?;
    if payload_segment.contains('.') {
        return Err("Malformed ticket: expected three segments".into());
    }

    let header_bytes = decode_segment(header_segment, "header")?;
    let payload_bytes = decode_segment(payload_segment, "payload")?;
    let signature = decode_segment(signature_segment, "signature")?;

    let header: TicketHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| format!("Malformed ticket header: {}", e))?;
    let payload: AuditTicketPayload = serde_json::from_slice(&payload_bytes)
        .map_err(|e| format!("Malformed ticket payload: {}", e))?;

    Ok(ParsedTicket {
        signing_input,
        header,
        payload,
        signature,
    })
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>, String> {
    if segment.is_empty() {
        return Err(format!("Malformed ticket: empty {} segment", name));
    }
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| format!("Malformed ticket {} encoding: {}", name, e))
}
