//! PIN hash verification compatible with Werkzeug's password hashes.
//!
//! Stored hashes look like `method$salt$hexdigest`, where `method` is one of
//! - `pbkdf2:<sha256|sha512|sha1>[:iterations]` (key length = digest size)
//! - `scrypt:<n>:<r>:<p>` (64-byte key)
//!
//! The salt is used as its UTF-8 bytes. Anything that fails to parse
//! simply does not verify.

use campusdesk_core::credentials::CredentialVerifier;
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

/// Werkzeug's default PBKDF2 work factor.
pub const DEFAULT_PBKDF2_ROUNDS: u32 = 600_000;

const SALT_LEN: usize = 16;

/// Errors from parsing a stored hash.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashFormatError {
    #[error("expected method$salt$hash")]
    Layout,

    #[error("unsupported hash method: {0}")]
    UnsupportedMethod(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("digest is not valid hex")]
    Hex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Digest {
    Sha1,
    Sha256,
    Sha512,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Method {
    Pbkdf2 { digest: Digest, rounds: u32 },
    Scrypt { log_n: u8, r: u32, p: u32 },
}

impl Method {
    /// Length of the key Werkzeug stores for this method.
    fn key_len(&self) -> usize {
        match self {
            Method::Pbkdf2 { digest: Digest::Sha1, .. } => 20,
            Method::Pbkdf2 { digest: Digest::Sha256, .. } => 32,
            Method::Pbkdf2 { digest: Digest::Sha512, .. } => 64,
            Method::Scrypt { .. } => 64,
        }
    }
}

#[derive(Debug)]
struct ParsedHash<'a> {
    method: Method,
    salt: &'a str,
    expected: Vec<u8>,
}

fn parse(stored: &str) -> Result<ParsedHash<'_>, HashFormatError> {
    let mut parts = stored.splitn(3, '$');
    let (Some(method), Some(salt), Some(digest_hex)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(HashFormatError::Layout);
    };

    let expected = hex::decode(digest_hex).map_err(|_| HashFormatError::Hex)?;
    if expected.is_empty() {
        return Err(HashFormatError::Hex);
    }

    let fields: Vec<&str> = method.split(':').collect();
    let method = match fields.as_slice() {
        ["pbkdf2", digest, rest @ ..] => {
            let digest = match *digest {
                "sha1" => Digest::Sha1,
                "sha256" => Digest::Sha256,
                "sha512" => Digest::Sha512,
                other => return Err(HashFormatError::UnsupportedMethod(format!("pbkdf2:{other}"))),
            };
            let rounds = match rest {
                [] => DEFAULT_PBKDF2_ROUNDS,
                [rounds] => parse_param(rounds, "iterations")?,
                _ => return Err(HashFormatError::InvalidParameter(method.into())),
            };
            if rounds == 0 {
                return Err(HashFormatError::InvalidParameter("iterations".into()));
            }
            Method::Pbkdf2 { digest, rounds }
        }
        ["scrypt", n, r, p] => {
            let n: u64 = parse_param(n, "n")?;
            if n < 2 || !n.is_power_of_two() {
                return Err(HashFormatError::InvalidParameter("n".into()));
            }
            Method::Scrypt {
                log_n: n.trailing_zeros() as u8,
                r: parse_param(r, "r")?,
                p: parse_param(p, "p")?,
            }
        }
        _ => return Err(HashFormatError::UnsupportedMethod(method.into())),
    };

    Ok(ParsedHash {
        method,
        salt,
        expected,
    })
}

fn parse_param<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, HashFormatError> {
    raw.parse()
        .map_err(|_| HashFormatError::InvalidParameter(name.into()))
}

fn derive(parsed: &ParsedHash<'_>, secret: &str) -> Option<Vec<u8>> {
    let mut out = vec![0u8; parsed.method.key_len()];
    let password = secret.as_bytes();
    let salt = parsed.salt.as_bytes();

    match parsed.method {
        Method::Pbkdf2 { digest, rounds } => match digest {
            Digest::Sha1 => pbkdf2_hmac::<Sha1>(password, salt, rounds, &mut out),
            Digest::Sha256 => pbkdf2_hmac::<Sha256>(password, salt, rounds, &mut out),
            Digest::Sha512 => pbkdf2_hmac::<Sha512>(password, salt, rounds, &mut out),
        },
        Method::Scrypt { log_n, r, p } => {
            let params = scrypt::Params::new(log_n, r, p, out.len()).ok()?;
            scrypt::scrypt(password, salt, &params, &mut out).ok()?;
        }
    }
    Some(out)
}

/// Verifies PINs against Werkzeug-format hashes.
#[derive(Debug, Clone, Copy, Default)]
pub struct WerkzeugVerifier;

impl WerkzeugVerifier {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialVerifier for WerkzeugVerifier {
    fn verify(&self, secret: &str, stored_hash: &str) -> bool {
        let parsed = match parse(stored_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored PIN hash is not in a supported format");
                return false;
            }
        };
        match derive(&parsed, secret) {
            // Slices of unequal length compare unequal.
            Some(derived) => derived.as_slice().ct_eq(parsed.expected.as_slice()).into(),
            None => false,
        }
    }
}

/// Hash a PIN as `pbkdf2:sha256:600000$<salt>$<hex>`.
pub fn hash_pin(secret: &str) -> String {
    hash_pin_with_rounds(secret, DEFAULT_PBKDF2_ROUNDS)
}

/// Hash a PIN with an explicit PBKDF2-SHA256 work factor.
pub fn hash_pin_with_rounds(secret: &str, rounds: u32) -> String {
    let rounds = rounds.max(1);
    let salt: String = rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect();

    let mut out = [0u8; 32];
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt.as_bytes(), rounds, &mut out);
    format!("pbkdf2:sha256:{rounds}${salt}${}", hex::encode(out))
}
