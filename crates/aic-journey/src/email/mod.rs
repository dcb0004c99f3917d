//! Fetching one-time codes delivered by email.

mod imap_inbox;

use std::{fmt, sync::Arc, time::Duration};

use aic_core::ConfigError;
use thiserror::Error;
use tracing::debug;

pub use imap_inbox::{ImapInbox, GMAIL_IMAP_HOST, IMAPS_PORT};

/// Wait applied before searching, to give the platform time to deliver the message.
pub const DEFAULT_EMAIL_DELAY: Duration = Duration::from_millis(5000);

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("No emails were found using the provided filter")]
    NoMatchingEmail,
    #[error("The matching email has no body")]
    EmptyMessage,
    #[error("No inbox is configured for this journey; set GMAIL and GMAIL_APP_PASSWORD")]
    NoInbox,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Imap(#[from] imap::error::Error),
    #[error(transparent)]
    Tls(#[from] native_tls::Error),
    #[error(transparent)]
    Parse(#[from] mailparse::MailParseError),
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

/// Extracts the wanted value from the plain-text body of an email.
pub type EmailParser = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Which message to pick. Absent criteria are not applied.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmailFilter {
    pub sender: Option<String>,
    pub subject: Option<String>,
}

/// A mailbox that can return the plain-text body of its most recent matching message.
#[async_trait::async_trait]
pub trait Inbox: fmt::Debug + Send + Sync {
    /// Text of the most recent message matching `filter`, or [`EmailError::NoMatchingEmail`].
    async fn latest_text(&self, filter: &EmailFilter) -> Result<String, EmailError>;
}

/// Options of the `checkEmail` action.
#[derive(Clone, Default)]
pub struct CheckEmailParams {
    #[allow(missing_docs)]
    pub sender: Option<String>,
    #[allow(missing_docs)]
    pub subject: Option<String>,
    /// Defaults to [`extract_otp_from_email`].
    pub email_parser: Option<EmailParser>,
    /// Defaults to [`DEFAULT_EMAIL_DELAY`].
    pub time_delay: Option<Duration>,
}

impl fmt::Debug for CheckEmailParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckEmailParams")
            .field("sender", &self.sender)
            .field("subject", &self.subject)
            .field("email_parser", &self.email_parser.as_ref().map(|_| "custom"))
            .field("time_delay", &self.time_delay)
            .finish()
    }
}

impl CheckEmailParams {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(missing_docs)]
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    #[allow(missing_docs)]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[allow(missing_docs)]
    pub fn email_parser(mut self, parser: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.email_parser = Some(Arc::new(parser));
        self
    }

    #[allow(missing_docs)]
    pub fn time_delay(mut self, delay: Duration) -> Self {
        self.time_delay = Some(delay);
        self
    }

    fn filter(&self) -> EmailFilter {
        EmailFilter {
            sender: self.sender.clone().filter(|s| !s.is_empty()),
            subject: self.subject.clone().filter(|s| !s.is_empty()),
        }
    }
}

/// Default parser: the text after the first `:`, or the whole text when there is none.
///
/// Only the segment up to a following `:` is kept. The result is trimmed.
pub fn extract_otp_from_email(text: &str) -> String {
    let mut parts = text.split(':');
    let first = parts.next().unwrap_or_default();
    parts.next().unwrap_or(first).trim().to_owned()
}

/// Wait for the configured delay, then pull the latest matching email from `inbox` and parse it.
pub async fn check_email(inbox: &dyn Inbox, params: &CheckEmailParams) -> Result<String, EmailError> {
    let delay = params.time_delay.unwrap_or(DEFAULT_EMAIL_DELAY);
    let filter = params.filter();

    debug!(?delay, sender = ?filter.sender, subject = ?filter.subject, "checking email");
    tokio::time::sleep(delay).await;

    let text = inbox.latest_text(&filter).await?;
    let value = match &params.email_parser {
        Some(parser) => parser(&text),
        None => extract_otp_from_email(&text),
    };
    Ok(value)
}
