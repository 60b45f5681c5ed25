//! Password input for commands that take a plaintext password.
//!
//! Passwords never come from argv, where `ps` and shell history would see
//! them. `CREDO_PASSWORD` wins when set; otherwise the first line of stdin is
//! used, with a prompt on stderr when stdin is a terminal.

use std::io::{BufRead, IsTerminal, Write};

use crate::Result;

pub const PASSWORD_ENV: &str = "CREDO_PASSWORD";

/// Password from `CREDO_PASSWORD` or the first line of stdin.
pub fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        log::debug!("password taken from {PASSWORD_ENV}");
        return Ok(password);
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        let mut stderr = std::io::stderr();
        write!(stderr, "Password: ")?;
        stderr.flush()?;
    }
    read_first_line(stdin.lock())
}

/// First line of `reader` without its line terminator. Empty on EOF.
fn read_first_line(mut reader: impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(line)
}
