//! Interaction with the user during authorization.

use async_trait::async_trait;
use std::io::BufRead;

use super::AuthError;

/// Shows the authorization URL and collects the code the user pastes back.
#[async_trait]
pub trait CodePrompt: Send + Sync {
    /// Show the authorization URL to the user.
    fn present(&self, auth_url: &str);

    /// Wait for the authorization code.
    ///
    /// There is no timeout; implementations may block indefinitely.
    async fn read_code(&self) -> Result<String, AuthError>;
}

/// Prompt on the terminal: prints the URL to stdout and reads one line of stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl StdinPrompt {
    /// Create a terminal prompt.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CodePrompt for StdinPrompt {
    fn present(&self, auth_url: &str) {
        println!(
            "Go to the following link in your browser then type the authorization code:\n{}",
            auth_url
        );
    }

    async fn read_code(&self) -> Result<String, AuthError> {
        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await
        .map_err(|e| AuthError::CodeUnavailable {
            message: format!("prompt task failed: {}", e),
        })?
        .map_err(|e| AuthError::CodeUnavailable {
            message: e.to_string(),
        })?;

        parse_code(&line)
    }
}

/// Take the first whitespace-separated token of a pasted line.
pub(crate) fn parse_code(line: &str) -> Result<String, AuthError> {
    line.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| AuthError::CodeUnavailable {
            message: "no code entered".to_string(),
        })
}
