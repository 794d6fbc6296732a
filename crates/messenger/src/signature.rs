//! Webhook authenticity checks.

use {
    hmac::{Hmac, Mac},
    sha1::Sha1,
    tracing::warn,
};

use crate::error::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

/// Verify the `X-Hub-Signature` header (`sha1=<hex>`) against the raw body.
///
/// An empty `app_secret` rejects every request: an empty HMAC key is one
/// anybody can sign with.
pub fn verify_signature(
    body: &[u8],
    signature_header: Option<&str>,
    app_secret: &str,
) -> Result<()> {
    if app_secret.is_empty() {
        return Err(Error::signature_invalid("no app secret configured"));
    }
    let header = signature_header.ok_or(Error::SignatureMissing)?;
    let Some((method, provided)) = header.split_once('=') else {
        return Err(Error::signature_invalid("malformed header"));
    };
    if !method.eq_ignore_ascii_case("sha1") {
        return Err(Error::signature_invalid(format!("unsupported method '{method}'")));
    }

    let mut mac = HmacSha1::new_from_slice(app_secret.as_bytes())
        .map_err(|_| Error::signature_invalid("unusable app secret"))?;
    mac.update(body);
    let computed = hex::encode(mac.finalize().into_bytes());

    if constant_time_eq(&computed, &provided.to_ascii_lowercase()) {
        Ok(())
    } else {
        warn!("webhook signature mismatch");
        Err(Error::signature_invalid("digest mismatch"))
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Answer a webhook subscription handshake.
///
/// Returns the challenge to echo back when the verify token matches. `mode`
/// must be `subscribe` when the platform sends it; older callers omit it.
pub fn verify_subscription(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected_token: &str,
) -> Option<String> {
    if mode.is_some_and(|m| m != "subscribe") {
        return None;
    }
    if token? != expected_token {
        return None;
    }
    challenge.map(str::to_owned)
}
