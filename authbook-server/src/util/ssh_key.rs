use russh::keys::{PrivateKey, decode_secret_key};
use tracing::debug;

/// Decodes with the password first. PEM decoders that only accept a password
/// for encrypted input reject an unencrypted key paired with one, so a failed
/// attempt is retried without it.
fn decode(key: &str, password: Option<&str>) -> Option<PrivateKey> {
    let key = key.trim();
    let password = password.filter(|p| !p.is_empty());
    let result = match decode_secret_key(key, password) {
        Err(_) if password.is_some() => decode_secret_key(key, None),
        result => result,
    };
    match result {
        Ok(key) => Some(key),
        Err(err) => {
            debug!("private key rejected: {}", err);
            None
        }
    }
}

/// Whether `key` is a well formed private key (OpenSSH, PKCS#1 or PKCS#8)
/// that can be decrypted with `password`. An encrypted key without a
/// password is invalid.
pub fn validate_ssh_private_key(key: &str, password: Option<&str>) -> bool {
    decode(key, password).is_some()
}

/// OpenSSH public key line (`<algorithm> <base64>`) for a private key, without
/// the comment.
pub fn public_key_from_private(key: &str, password: Option<&str>) -> Option<String> {
    let private = decode(key, password)?;
    let line = private.public_key().to_openssh().ok()?;
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(algorithm), Some(data)) => Some(format!("{} {}", algorithm, data)),
        _ => None,
    }
}
