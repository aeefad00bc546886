use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::PasswordError;

pub const HASH_SCHEME: &str = "pbkdf2-sha256";
pub const SALT_LENGTH: usize = 16;
pub const HASH_LENGTH: usize = 32;

fn derive(password: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; HASH_LENGTH]> {
    let mut out = Zeroizing::new([0u8; HASH_LENGTH]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut *out);
    out
}

/// Hash a password with a fresh random salt.
///
/// Encoded as `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`; the
/// iteration count travels with each hash.
pub fn hash_password(password: &str, iterations: u32) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }
    if iterations == 0 {
        return Err(PasswordError::InvalidIterations);
    }
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    let hash = derive(password, &salt, iterations);
    Ok(format!(
        "{HASH_SCHEME}${iterations}${}${}",
        BASE64.encode(salt),
        BASE64.encode(&hash[..])
    ))
}

/// Check a password against an encoded hash in constant time.
pub fn verify_password(password: &str, encoded: &str) -> Result<bool, PasswordError> {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) =
        (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(PasswordError::MalformedHash);
    };
    if scheme != HASH_SCHEME {
        return Err(PasswordError::MalformedHash);
    }
    let iterations: u32 = iterations.parse().map_err(|_| PasswordError::MalformedHash)?;
    if iterations == 0 {
        return Err(PasswordError::MalformedHash);
    }
    let salt = BASE64.decode(salt).map_err(|_| PasswordError::MalformedHash)?;
    let expected = BASE64.decode(expected).map_err(|_| PasswordError::MalformedHash)?;
    if expected.len() != HASH_LENGTH {
        return Err(PasswordError::MalformedHash);
    }

    let actual = derive(password, &salt, iterations);
    Ok(actual[..].ct_eq(expected.as_slice()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    #[test]
    fn hash_then_verify() {
        let encoded = hash_password("s3cret", FAST).unwrap();
        assert!(encoded.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password("s3cret", &encoded).unwrap());
        assert!(!verify_password("wrong", &encoded).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same", FAST).unwrap();
        let b = hash_password("same", FAST).unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same", &a).unwrap());
        assert!(verify_password("same", &b).unwrap());
    }

    #[test]
    fn empty_password_is_rejected() {
        assert_eq!(hash_password("", FAST), Err(PasswordError::Empty));
        assert_eq!(hash_password("x", 0), Err(PasswordError::InvalidIterations));
    }

    #[test]
    fn malformed_hashes_are_errors() {
        for bad in [
            "",
            "plaintext",
            "md5$1000$AAAA$AAAA",
            "pbkdf2-sha256$abc$AAAA$AAAA",
            "pbkdf2-sha256$1000$!!!$AAAA",
            "pbkdf2-sha256$1000$AAAA$AAAA",
            "pbkdf2-sha256$1000$AAAA$AAAA$extra",
        ] {
            assert_eq!(verify_password("x", bad), Err(PasswordError::MalformedHash), "{bad}");
        }
    }
}
