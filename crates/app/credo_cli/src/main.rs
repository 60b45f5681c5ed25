// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use credo_core::auth::{Credential, PasswordHasher};
use credo_core::config::{AuthConfig, bcrypt_cost_from_env};
use credo_core::models::auth::StoredHash;

mod cli;
mod logging;
mod password;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();

    match args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Commands::Check { email, name } => {
            let password = password::read_password()?;
            let credential = Credential::new(&email, &name, &password)?;
            let summary = serde_json::json!({
                "email": credential.email(),
                "name": credential.name(),
                "createdAt": credential.created_at(),
                "updatedAt": credential.updated_at(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
            log::info!("credential accepted");
        }
        Commands::Hash => {
            let password = password::read_password()?;
            let hasher = PasswordHasher::with_cost(bcrypt_cost_from_env()?)?;
            let hash = hasher.hash(&password)?;
            println!("{hash}");
            log::debug!("hashed with cost {}", hasher.cost());
        }
        Commands::Verify { hash } => {
            let password = password::read_password()?;
            // Verification reads the cost embedded in the hash.
            let hasher = PasswordHasher::default();
            if !hasher.verify(&password, &StoredHash::new(hash)) {
                return Err(Error::Custom("Password does not match".into()));
            }
            println!("ok");
        }
        Commands::Issue { subject_id, email } => {
            let tokens = AuthConfig::from_env()?.token_service()?;
            let token = tokens.issue(subject_id, &email)?;
            println!("{token}");
            log::info!("issued token for subject {subject_id}");
        }
        Commands::Validate { token } => {
            let tokens = AuthConfig::from_env()?.token_service()?;
            let claims = tokens.validate(&token)?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
    }

    Ok(())
}
