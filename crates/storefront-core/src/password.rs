//! Salted PBKDF2-HMAC-SHA256 password hashes.
//!
//! Encoded form: `pbkdf2-sha256$<rounds>$<salt b64>$<digest b64>`.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::Sha256;

const SCHEME: &str = "pbkdf2-sha256";
const ROUNDS: u32 = 10_000;
const SALT_LEN: usize = 16;

fn derive(password: &str, salt: &[u8], rounds: u32) -> [u8; 32] {
    let mut digest = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds.max(1), &mut digest);
    digest
}

pub fn hash(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = derive(password, &salt, ROUNDS);
    format!(
        "{SCHEME}${ROUNDS}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(digest)
    )
}

/// Returns `None` when `encoded` is not a hash this module produced.
pub fn verify(password: &str, encoded: &str) -> Option<bool> {
    let mut parts = encoded.split('$');
    let (Some(SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return None;
    };
    let rounds: u32 = rounds.parse().ok()?;
    let salt = STANDARD_NO_PAD.decode(salt).ok()?;
    let expected = STANDARD_NO_PAD.decode(expected).ok()?;

    let actual = derive(password, &salt, rounds);
    if expected.len() != actual.len() {
        return Some(false);
    }
    let diff = actual
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));
    Some(diff == 0)
}
