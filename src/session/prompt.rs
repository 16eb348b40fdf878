//! Line-oriented operator prompts.
//!
//! Questions are written to the output without a trailing newline and the
//! answer is read as one line from the input. Generic over the reader and
//! writer so the interactive loop can be driven from a script in tests.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Prompter bound to the process's stdin and stdout.
pub type StdioPrompter = Prompter<BufReader<tokio::io::Stdin>, tokio::io::Stdout>;

/// Reads answers from `R` and writes prompts and messages to `W`.
pub struct Prompter<R, W> {
    reader: R,
    writer: W,
}

impl StdioPrompter {
    /// Creates a prompter on stdin/stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Prompter<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a prompter over arbitrary streams.
    pub const fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Reads the next line, without its line terminator.
    ///
    /// Returns `None` if the input is closed (EOF).
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            return Ok(None);
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        Ok(Some(line))
    }

    /// Writes `question` and returns the trimmed answer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or reading fails.
    pub async fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        self.writer.write_all(question.as_bytes()).await?;
        self.writer.write_all(b" ").await?;
        self.writer.flush().await?;

        Ok(self.read_line().await?.map(|answer| answer.trim().to_string()))
    }

    /// Asks a yes/no question. Only `y`/`yes` (any case) count as yes.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or reading fails.
    pub async fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.ask(question).await?;
        Ok(answer.is_some_and(|a| a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes")))
    }

    /// Writes one line of output.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub async fn say(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    /// Returns the underlying streams.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}
