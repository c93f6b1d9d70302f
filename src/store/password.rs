use super::StoreError;
use secrecy::{ExposeSecret, SecretString};

pub const DEFAULT_COST: u32 = 12;
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// bcrypt hashes only the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Salted, adaptive-cost password hashing (bcrypt).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// # Errors
    /// Returns an error if `cost` is outside 4..=31.
    pub fn new(cost: u32) -> anyhow::Result<Self> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(anyhow::anyhow!(
                "bcrypt cost must be between {MIN_COST} and {MAX_COST}, got {cost}"
            ));
        }

        Ok(Self { cost })
    }

    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash on the blocking pool; bcrypt is deliberately slow.
    ///
    /// # Errors
    /// Returns an error if hashing fails or the blocking task panics.
    pub async fn hash(&self, password: &SecretString) -> Result<String, StoreError> {
        let cost = self.cost;
        let password = password.clone();

        let hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(password.expose_secret(), cost))
                .await??;

        Ok(hash)
    }

    /// Compare `password` against a stored bcrypt hash.
    ///
    /// # Errors
    /// Returns an error if `hash` is not a bcrypt hash.
    pub async fn verify(&self, password: &SecretString, hash: &str) -> Result<bool, StoreError> {
        let password = password.clone();
        let hash = hash.to_string();

        let matched =
            tokio::task::spawn_blocking(move || bcrypt::verify(password.expose_secret(), &hash))
                .await??;

        Ok(matched)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}
