//! Interactive download loop.
//!
//! The loop asks for a part ID and a file type, runs one download attempt,
//! and after any failure offers a fresh personal access token. A rejected
//! token repeats the same attempt with the new one; any other failure goes
//! back to the part prompt. Transitions are explicit `Step` values:
//!
//! ```text
//! PromptPart ──▶ PromptKind ──▶ Attempt ──success──▶ PromptPart
//!   ▲  │ q/EOF                   │ failure
//!   │  ▼                         ▼
//!   │ Quit ◀──── declined ──── OfferRetry ──new token, 401──▶ Attempt
//!   └────────────────────────────┘ new token, other failure
//! ```

pub mod prompt;

pub use prompt::{Prompter, StdioPrompter};

use std::io;
use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{error, info};

use crate::portal::{download_part, Credential, FileKind, PortalClient, PortalError};

const PART_PROMPT: &str =
    "Enter the part ID to download ('q' to quit, 'find <part number>' to search):";
const KIND_PROMPT: &str = "Download the DXF file or the 3D macro? (dxf/3d):";
const TOKEN_PROMPT: &str = "Enter your personal access token (PAT):";
const RETRY_PROMPT: &str = "Try again with a new personal access token? (y/n):";

/// One state of the interactive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    /// Waiting for a part ID.
    PromptPart,
    /// Part ID known, waiting for the file type.
    PromptKind {
        /// Part to download.
        part_id: String,
    },
    /// Running a download attempt.
    Attempt {
        /// Part to download.
        part_id: String,
        /// Requested artifact.
        kind: FileKind,
    },
    /// The last attempt failed; asking whether to continue with a new token.
    OfferRetry {
        /// Attempt to repeat once the token is replaced. Only set when the
        /// portal rejected the token.
        repeat: Option<(String, FileKind)>,
    },
    /// Terminating.
    Quit,
}

/// Counters reported when the loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Download attempts started.
    pub attempts: usize,
    /// Attempts that wrote at least one file.
    pub successes: usize,
    /// Times the operator was offered a retry.
    pub retry_prompts: usize,
}

/// The interactive loop around a [`PortalClient`].
pub struct Session<R, W> {
    client: PortalClient,
    prompter: Prompter<R, W>,
    output_dir: PathBuf,
    summary: SessionSummary,
}

impl<R, W> Session<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a session writing downloads into `output_dir`.
    pub fn new(client: PortalClient, prompter: Prompter<R, W>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            prompter,
            output_dir: output_dir.into(),
            summary: SessionSummary::default(),
        }
    }

    /// Runs until the operator quits, declines a retry, or closes the input.
    ///
    /// # Errors
    ///
    /// Returns an error only if the prompt streams fail.
    pub async fn run(&mut self) -> io::Result<SessionSummary> {
        let mut step = Step::PromptPart;

        loop {
            step = match step {
                Step::PromptPart => self.prompt_part().await?,
                Step::PromptKind { part_id } => self.prompt_kind(part_id).await?,
                Step::Attempt { part_id, kind } => self.attempt(part_id, kind).await?,
                Step::OfferRetry { repeat } => self.offer_retry(repeat).await?,
                Step::Quit => break,
            };
        }

        self.prompter.say("Exiting.").await?;
        info!(
            attempts = self.summary.attempts,
            successes = self.summary.successes,
            "Session finished"
        );

        Ok(self.summary)
    }

    /// Consumes the session, returning its prompter.
    pub fn into_prompter(self) -> Prompter<R, W> {
        self.prompter
    }

    async fn prompt_part(&mut self) -> io::Result<Step> {
        let Some(input) = self.prompter.ask(PART_PROMPT).await? else {
            return Ok(Step::Quit);
        };

        if input.is_empty() {
            self.prompter.say("The part ID must not be empty.").await?;
            return Ok(Step::PromptPart);
        }

        if input.eq_ignore_ascii_case("q") {
            return Ok(Step::Quit);
        }

        let (keyword, rest) = input
            .split_once(char::is_whitespace)
            .unwrap_or((input.as_str(), ""));
        if keyword.eq_ignore_ascii_case("find") {
            let part_number = rest.trim();
            if part_number.is_empty() {
                self.prompter.say("Usage: find <part number>").await?;
            } else {
                self.search(part_number).await?;
            }
            return Ok(Step::PromptPart);
        }

        Ok(Step::PromptKind { part_id: input })
    }

    async fn prompt_kind(&mut self, part_id: String) -> io::Result<Step> {
        let mut question = KIND_PROMPT;

        loop {
            let Some(input) = self.prompter.ask(question).await? else {
                return Ok(Step::Quit);
            };

            match input.parse::<FileKind>() {
                Ok(kind) => return Ok(Step::Attempt { part_id, kind }),
                Err(_) => question = "Please enter 'dxf' or '3d':",
            }
        }
    }

    async fn attempt(&mut self, part_id: String, kind: FileKind) -> io::Result<Step> {
        self.summary.attempts += 1;
        self.prompter
            .say(&format!("Downloading {kind} for part {part_id}..."))
            .await?;

        match download_part(&self.client, &part_id, kind, &self.output_dir).await {
            Ok(outcome) if outcome.succeeded() => {
                for path in outcome.files() {
                    self.prompter
                        .say(&format!("File saved as: {}", path.display()))
                        .await?;
                }
                self.prompter
                    .say(&format!("Part {part_id} downloaded successfully."))
                    .await?;
                self.summary.successes += 1;
                Ok(Step::PromptPart)
            }
            Ok(outcome) => {
                self.prompter
                    .say(&format!("Download incomplete: {outcome}."))
                    .await?;
                Ok(Step::OfferRetry { repeat: None })
            }
            Err(e) => {
                error!(part_id = %part_id, kind = %kind, error = %e, "Download attempt failed");
                self.report_error(&e).await?;
                let repeat = e.is_unauthorized().then_some((part_id, kind));
                Ok(Step::OfferRetry { repeat })
            }
        }
    }

    async fn offer_retry(&mut self, repeat: Option<(String, FileKind)>) -> io::Result<Step> {
        self.summary.retry_prompts += 1;

        if !self.prompter.confirm(RETRY_PROMPT).await? {
            return Ok(Step::Quit);
        }

        let Some(credential) = prompt_credential(&mut self.prompter).await? else {
            return Ok(Step::Quit);
        };
        self.client.set_credential(credential);

        Ok(match repeat {
            Some((part_id, kind)) => Step::Attempt { part_id, kind },
            None => Step::PromptPart,
        })
    }

    async fn search(&mut self, part_number: &str) -> io::Result<()> {
        match self.client.search_part(part_number).await {
            Ok(Some(summary)) => {
                self.prompter
                    .say(&format!(
                        "Part number {part_number} has part ID {}: {}",
                        summary.id, summary.description
                    ))
                    .await
            }
            Ok(None) => {
                self.prompter
                    .say(&format!("No part found for part number {part_number}."))
                    .await
            }
            Err(e) => self.report_error(&e).await,
        }
    }

    async fn report_error(&mut self, e: &PortalError) -> io::Result<()> {
        self.prompter.say(&format!("Error: {e}")).await?;
        if let Some(diagnostics) = e.diagnostics() {
            self.prompter.say(&diagnostics.to_string()).await?;
        }
        if e.is_unauthorized() {
            self.prompter
                .say("The personal access token was rejected.")
                .await?;
        }
        Ok(())
    }
}

/// Uses `EPLAN_PAT` if it holds a valid token, otherwise prompts.
///
/// Returns `None` if the input closes before a valid token is entered.
///
/// # Errors
///
/// Returns an error if the prompt streams fail.
pub async fn acquire_credential<R, W>(prompter: &mut Prompter<R, W>) -> io::Result<Option<Credential>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if let Some(credential) = Credential::from_env() {
        info!("Using personal access token from environment");
        return Ok(Some(credential));
    }

    prompt_credential(prompter).await
}

/// Prompts until a well-formed token is entered.
///
/// Returns `None` if the input closes first.
///
/// # Errors
///
/// Returns an error if the prompt streams fail.
pub async fn prompt_credential<R, W>(prompter: &mut Prompter<R, W>) -> io::Result<Option<Credential>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let Some(input) = prompter.ask(TOKEN_PROMPT).await? else {
            return Ok(None);
        };

        match Credential::new(&input) {
            Ok(credential) => return Ok(Some(credential)),
            Err(e) => prompter.say(&format!("Invalid token: {e}")).await?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prompt_credential_reprompts_until_valid() {
        let input: &[u8] = b"\nshort\nvalid-token-0001\n";
        let mut prompter = Prompter::new(input, Vec::new());

        let credential = prompt_credential(&mut prompter).await.unwrap();
        assert_eq!(credential, Some(Credential::new("valid-token-0001").unwrap()));

        let (_, output) = prompter.into_inner();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.matches(TOKEN_PROMPT).count(), 3);
        assert!(output.contains("Invalid token: personal access token is required"));
        assert!(output.contains("too short"));
    }

    #[tokio::test]
    async fn prompt_credential_eof() {
        let input: &[u8] = b"";
        let mut prompter = Prompter::new(input, Vec::new());
        assert_eq!(prompt_credential(&mut prompter).await.unwrap(), None);
    }
}
