use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use salon_engine::error::{Result, SalonError};
use salon_engine::reminders::{Email, Mailer};

/// Writes each email as one JSON line, to a file or stdout. A delivery
/// process picks the lines up from there.
pub struct OutboxMailer {
    path: Option<PathBuf>,
}

impl OutboxMailer {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl Mailer for OutboxMailer {
    fn send(&mut self, email: &Email) -> Result<()> {
        let line = serde_json::to_string(email)?;
        match &self.path {
            Some(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| SalonError::Mail(format!("cannot open outbox {}: {}", path.display(), e)))?;
                writeln!(file, "{}", line)?;
            }
            None => {
                writeln!(io::stdout().lock(), "{}", line)?;
            }
        }
        Ok(())
    }
}
