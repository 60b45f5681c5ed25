//! Runtime configuration for the auth components.

use std::path::{Path, PathBuf};

use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::jwt::{TokenError, TokenService};
use crate::auth::password::{DEFAULT_COST, HashError, PasswordHasher};

const SECRET_FILE_NAME: &str = "token-secret";
const GENERATED_SECRET_LEN: usize = 64;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Secret file {path}: {source}")]
    SecretFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Secret file {path} is accessible to other users (mode {mode:o}); expected 600")]
    InsecureSecretFile { path: PathBuf, mode: u32 },
}

/// Secret key and hashing cost shared by the auth components.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Token signing secret.
    pub secret_key: SecretString,
    /// bcrypt cost factor.
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                        | Default                                  |
    /// |---------------------------------|------------------------------------------|
    /// | `CREDO_SECRET` / `JWT_SECRET`   | generated & persisted to `token-secret`  |
    /// | `CREDO_BCRYPT_COST`             | `10`                                     |
    /// | `CREDO_DATA_DIR`                | `<platform data dir>/credo`              |
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: resolve_secret_key(&data_dir())?,
            bcrypt_cost: bcrypt_cost_from_env()?,
        })
    }

    pub fn password_hasher(&self) -> Result<PasswordHasher, HashError> {
        PasswordHasher::with_cost(self.bcrypt_cost)
    }

    pub fn token_service(&self) -> Result<TokenService, TokenError> {
        TokenService::new(self.secret_key.expose_secret())
    }
}

/// bcrypt cost from `CREDO_BCRYPT_COST`, defaulting to 10. Range is checked
/// when the hasher is built.
pub fn bcrypt_cost_from_env() -> Result<u32, ConfigError> {
    match std::env::var("CREDO_BCRYPT_COST") {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidValue {
                var: "CREDO_BCRYPT_COST",
                value: raw.clone(),
            }),
        Err(_) => Ok(DEFAULT_COST),
    }
}

/// Resolve the token secret: env var `CREDO_SECRET` → `JWT_SECRET` →
/// persisted file in `dir` → freshly generated and persisted.
pub fn resolve_secret_key(dir: &Path) -> Result<SecretString, ConfigError> {
    for var in ["CREDO_SECRET", "JWT_SECRET"] {
        if let Ok(secret) = std::env::var(var)
            && !secret.is_empty()
        {
            debug!(var, "token secret taken from environment");
            return Ok(SecretString::from(secret));
        }
    }

    let secret_path = dir.join(SECRET_FILE_NAME);
    let io_err = |source: std::io::Error| ConfigError::SecretFile {
        path: secret_path.clone(),
        source,
    };
    match std::fs::read_to_string(&secret_path) {
        Ok(existing) => {
            check_owner_only(&secret_path)?;
            let trimmed = existing.trim();
            if !trimmed.is_empty() {
                return Ok(SecretString::from(trimmed.to_string()));
            }
            std::fs::remove_file(&secret_path).map_err(io_err)?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(e)),
    }

    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect();
    std::fs::create_dir_all(dir).map_err(io_err)?;
    write_owner_only(&secret_path, &secret).map_err(io_err)?;
    info!(path = %secret_path.display(), "generated new token secret");
    Ok(SecretString::from(secret))
}

/// Create `path` readable by the owner only and write `contents`. Fails if
/// the file already exists.
fn write_owner_only(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

/// Refuse a persisted secret that group or other users can access.
#[cfg(unix)]
fn check_owner_only(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)
        .map_err(|source| ConfigError::SecretFile {
            path: path.to_path_buf(),
            source,
        })?
        .permissions()
        .mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecureSecretFile {
            path: path.to_path_buf(),
            mode: mode & 0o777,
        });
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_owner_only(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

/// Directory for persisted state: `CREDO_DATA_DIR` or the platform data dir.
fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CREDO_DATA_DIR")
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("credo")
}
