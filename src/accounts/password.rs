//! How a new account password is chosen: generated or given.

use std::fmt;

use rand::Rng;
use zeroize::Zeroizing;

use crate::errors::{PwVaultError, Result};
use crate::vault::record::validate_password;

/// Alphabet used for generated passwords unless configured otherwise.
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Length of generated passwords unless configured otherwise.
pub const DEFAULT_LENGTH: usize = 8;

/// Either "random of length N from alphabet A" or "exactly this string".
#[derive(Clone)]
pub enum PasswordSpec {
    Random { length: usize, alphabet: String },
    Literal(Zeroizing<String>),
}

impl PasswordSpec {
    pub fn random(length: usize, alphabet: &str) -> Self {
        PasswordSpec::Random {
            length,
            alphabet: alphabet.to_string(),
        }
    }

    pub fn literal(password: &str) -> Self {
        PasswordSpec::Literal(Zeroizing::new(password.to_string()))
    }

    /// Produce the password this spec describes, validating it.
    pub fn resolve(&self) -> Result<Zeroizing<String>> {
        match self {
            PasswordSpec::Random { length, alphabet } => generate_password(alphabet, *length),
            PasswordSpec::Literal(password) => {
                validate_password(password)?;
                Ok(password.clone())
            }
        }
    }
}

impl Default for PasswordSpec {
    fn default() -> Self {
        PasswordSpec::random(DEFAULT_LENGTH, DEFAULT_ALPHABET)
    }
}

impl fmt::Debug for PasswordSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordSpec::Random { length, alphabet } => f
                .debug_struct("Random")
                .field("length", length)
                .field("alphabet", alphabet)
                .finish(),
            PasswordSpec::Literal(_) => f.write_str("Literal(<redacted>)"),
        }
    }
}

/// Generate `length` characters drawn uniformly from `alphabet`.
///
/// Repeated characters in the alphabet count once. The alphabet must be
/// non-empty and whitespace-free, and `length` must be at least 1.
pub fn generate_password(alphabet: &str, length: usize) -> Result<Zeroizing<String>> {
    if length == 0 {
        return Err(PwVaultError::Validation(
            "password length must be greater than 0".into(),
        ));
    }
    if alphabet.chars().any(char::is_whitespace) {
        return Err(PwVaultError::Validation(
            "password alphabet cannot contain whitespace".into(),
        ));
    }

    let mut symbols: Vec<char> = Vec::new();
    for c in alphabet.chars() {
        if !symbols.contains(&c) {
            symbols.push(c);
        }
    }
    if symbols.is_empty() {
        return Err(PwVaultError::Validation(
            "password alphabet cannot be empty".into(),
        ));
    }

    let mut rng = rand::rng();
    let password: String = (0..length)
        .map(|_| symbols[rng.random_range(0..symbols.len())])
        .collect();
    Ok(Zeroizing::new(password))
}
