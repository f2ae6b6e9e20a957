//! HMAC-SHA256 webhook signature verification.
//!
//! GitHub signs each delivery with the hook's shared secret and presents the
//! result as `sha256=<hex>` in the `X-Hub-Signature-256` header. Deliveries
//! are verified against the raw body bytes before any parsing happens, and
//! the empty body that triggers a reconciliation sweep is signed like any
//! other payload.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Extracts the raw signature bytes from a `sha256=<hex>` header value.
///
/// Returns `None` for anything else: a missing or different algorithm
/// prefix, or hex that does not decode.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha256=")?;
    hex::decode(hex_sig).ok()
}

/// Signs a payload with the shared secret, returning the raw MAC bytes.
///
/// The server only ever verifies; this exists so tests and clients can
/// produce the header GitHub would send.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Renders raw MAC bytes as the header value GitHub sends.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Checks a delivery's signature header against the body and shared secret.
///
/// The comparison is constant-time via the MAC itself. Malformed headers
/// verify as false rather than erroring; the caller cannot distinguish a
/// forged signature from a mangled one, and should not.
///
/// ```
/// use pr_mirror::webhooks::{compute_signature, format_signature_header, verify_signature};
///
/// let body = br#"{"zen":"Design for failure."}"#;
/// let header = format_signature_header(&compute_signature(body, b"hook-secret"));
/// assert!(verify_signature(body, &header, b"hook-secret"));
/// assert!(!verify_signature(body, &header, b"other-secret"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(claimed) = parse_signature_header(signature_header) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    mac.verify_slice(&claimed).is_ok()
}
