use clap::{Parser, Subcommand};

/// Validate credentials, hash passwords and sign access tokens.
#[derive(Parser)]
#[command(name = "credo", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the version.
    Version,

    /// Validate signup input and print the normalized credential.
    ///
    /// The password is read from `CREDO_PASSWORD` or stdin.
    Check {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
    },

    /// Hash a password with bcrypt (cost from `CREDO_BCRYPT_COST`).
    ///
    /// The password is read from `CREDO_PASSWORD` or stdin.
    Hash,

    /// Check a password against a bcrypt hash.
    ///
    /// The password is read from `CREDO_PASSWORD` or stdin.
    Verify { hash: String },

    /// Issue a signed access token.
    Issue {
        #[arg(allow_negative_numbers = true)]
        subject_id: i64,
        email: String,
    },

    /// Validate an access token and print its claims.
    Validate { token: String },
}
