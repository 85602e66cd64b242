//! Human typable credentials derived from a seed.
//!
//! A credential is the hex encoded SHA-256 digest of a seed with `-`
//! separators inserted into it. When no dash pattern is given the gaps between
//! separators are drawn at random and returned as a [`DashPattern`] so the
//! caller can store it next to the subject record. Feeding the stored pattern
//! back in renders the exact same token again.

use std::fmt;
use std::str::FromStr;

use rand::{Rng, RngExt};
use sha2::{Digest, Sha256};

pub const SEPARATOR: char = '-';

const MIN_GAP: usize = 4;
const MAX_GAP: usize = 10;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential seed must not be empty")]
    EmptySeed,
    #[error("invalid dash pattern: {0}")]
    InvalidPattern(String),
}

/// Gaps, in characters, between consecutive separators of a token.
///
/// Persisted as a comma separated list, e.g. `"6,4,9"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DashPattern(Vec<usize>);

impl DashPattern {
    pub fn new(gaps: Vec<usize>) -> Self {
        Self(gaps)
    }

    /// Parses a stored pattern. A blank string is an empty pattern.
    pub fn parse(pattern: &str) -> Result<Self, CredentialError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Ok(Self::default());
        }
        pattern
            .split(',')
            .map(|gap| {
                gap.trim()
                    .parse::<usize>()
                    .map_err(|_| CredentialError::InvalidPattern(pattern.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Reads the separator positions of a rendered token back into gaps.
    pub fn from_token(token: &str) -> Self {
        let mut previous = 0;
        let mut gaps = Vec::new();
        for (index, c) in token.char_indices() {
            if c == SEPARATOR {
                gaps.push(index - previous);
                previous = index;
            }
        }
        Self(gaps)
    }

    pub fn gaps(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DashPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, gap) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{gap}")?;
        }
        Ok(())
    }
}

impl FromStr for DashPattern {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A rendered credential.
///
/// `pattern` is only set when the separators were placed at random; a
/// replayed credential has nothing new to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub pattern: Option<DashPattern>,
}

/// Lowercase hex SHA-256 of the seed, always 64 characters.
pub fn base_string(seed: &str) -> String {
    hex::encode(Sha256::digest(seed.as_bytes()).as_slice())
}

/// Renders the credential for `seed`.
///
/// With an empty or absent `pattern` the gaps are drawn from `rng` and
/// recorded; otherwise the pattern is replayed verbatim and `rng` is unused.
pub fn generate_credential<R>(
    seed: &str,
    pattern: Option<&DashPattern>,
    rng: &mut R,
) -> Result<Credential, CredentialError>
where
    R: Rng + ?Sized,
{
    if seed.is_empty() {
        return Err(CredentialError::EmptySeed);
    }
    let base = base_string(seed);
    match pattern {
        Some(pattern) if !pattern.is_empty() => Ok(Credential {
            token: replay(&base, pattern),
            pattern: None,
        }),
        _ => {
            let (token, pattern) = generate(&base, rng);
            Ok(Credential {
                token,
                pattern: Some(pattern),
            })
        }
    }
}

/// [`generate_credential`] with a stored, comma separated pattern and the
/// thread local RNG.
pub fn hash_password(seed: &str, pattern: Option<&str>) -> Result<Credential, CredentialError> {
    let pattern = pattern.map(DashPattern::parse).transpose()?;
    generate_credential(seed, pattern.as_ref(), &mut rand::rng())
}

/// Opaque access or refresh token.
pub fn generate_access_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Stable external id derived from a provider supplied value.
pub fn generate_external_id(seed: &str) -> String {
    base_string(seed)
}

fn generate<R>(base: &str, rng: &mut R) -> (String, DashPattern)
where
    R: Rng + ?Sized,
{
    let mut token = base.to_owned();
    let mut offset = 0;
    let mut gaps = Vec::new();
    for i in 0..base.len() {
        let gap = rng.random_range(MIN_GAP..=MAX_GAP);
        if i % gap != 0 {
            continue;
        }
        let next = offset + gap;
        // A separator past the end could not be read back from the token.
        if next > token.len() {
            continue;
        }
        token.insert(next, SEPARATOR);
        offset = next;
        gaps.push(gap);
    }
    (token, DashPattern(gaps))
}

fn replay(base: &str, pattern: &DashPattern) -> String {
    let gaps = pattern.gaps();
    let last = gaps.len() as isize - 2;
    let mut token = base.to_owned();
    let mut offset: usize = 0;
    for (i, gap) in gaps.iter().enumerate().take(base.len()) {
        offset = offset.saturating_add(*gap);
        if offset > token.len() {
            tracing::debug!(offset, len = token.len(), "dash pattern runs past the token");
        }
        token.insert(offset.min(token.len()), SEPARATOR);
        if last < i as isize {
            break;
        }
    }
    token
}
