//! PKCE (Proof Key for Code Exchange) verification.
//!
//! Only the S256 method is accepted (RFC 7636 §4.2).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Compute the S256 challenge for a verifier: `BASE64URL(SHA256(verifier))`.
#[must_use]
pub fn challenge_s256(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()))
}

/// Verify a code verifier against the challenge stored with the authorization code.
#[must_use]
pub fn verify_s256(code_verifier: &str, code_challenge: &str) -> bool {
    // RFC 7636 §4.1: 43..=128 characters
    if !(43..=128).contains(&code_verifier.len()) {
        return false;
    }
    challenge_s256(code_verifier) == code_challenge
}
