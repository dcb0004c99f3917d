use aic_core::{ConfigError, LibraryConfig};
use mailparse::{MailParseError, ParsedMail};
use tracing::debug;

use super::{EmailError, EmailFilter, Inbox};

#[allow(missing_docs)]
pub const GMAIL_IMAP_HOST: &str = "imap.gmail.com";
#[allow(missing_docs)]
pub const IMAPS_PORT: u16 = 993;

/// An IMAP mailbox reached over TLS, by default Gmail with an app password.
///
/// The `imap` client is blocking, so each lookup runs on tokio's blocking pool with a fresh
/// connection.
#[derive(Clone)]
pub struct ImapInbox {
    host: String,
    port: u16,
    user: String,
    password: String,
}

impl std::fmt::Debug for ImapInbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapInbox")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl ImapInbox {
    #[allow(missing_docs)]
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: GMAIL_IMAP_HOST.to_owned(),
            port: IMAPS_PORT,
            user: user.into(),
            password: password.into(),
        }
    }

    /// Uses the `GMAIL` and `GMAIL_APP_PASSWORD` settings.
    pub fn from_config(config: &LibraryConfig) -> Result<Self, ConfigError> {
        let (user, password) = config.require_mail_credentials()?;
        Ok(Self::new(user, password))
    }

    #[allow(missing_docs)]
    pub fn with_host(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    fn fetch_latest(&self, query: &str) -> Result<String, EmailError> {
        let tls = native_tls::TlsConnector::builder().build()?;
        let client = imap::connect((self.host.as_str(), self.port), &self.host, &tls)?;
        let mut session = client
            .login(&self.user, &self.password)
            .map_err(|(error, _client)| error)?;

        session.select("INBOX")?;
        let latest = session
            .search(query)?
            .into_iter()
            .max()
            .ok_or(EmailError::NoMatchingEmail)?;

        debug!(host = %self.host, %query, seq = latest, "fetching email");

        let messages = session.fetch(latest.to_string(), "RFC822")?;
        let raw = messages
            .iter()
            .find_map(|message| message.body())
            .ok_or(EmailError::EmptyMessage)?;
        let parsed = mailparse::parse_mail(raw)?;
        let text = plain_text(&parsed)?.unwrap_or_default();

        session.logout()?;
        Ok(text)
    }
}

/// IMAP `SEARCH` criteria for `filter`.
fn search_query(filter: &EmailFilter) -> String {
    let quote = |value: &str| format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""));

    let mut criteria = Vec::new();
    if let Some(sender) = &filter.sender {
        criteria.push(format!("FROM {}", quote(sender)));
    }
    if let Some(subject) = &filter.subject {
        criteria.push(format!("SUBJECT {}", quote(subject)));
    }

    if criteria.is_empty() {
        "ALL".to_owned()
    } else {
        criteria.join(" ")
    }
}

/// The first `text/plain` part, depth first; the root body for single-part messages.
fn plain_text(mail: &ParsedMail<'_>) -> Result<Option<String>, MailParseError> {
    if mail.subparts.is_empty() {
        return mail.get_body().map(Some);
    }
    find_text_part(mail)
}

fn find_text_part(mail: &ParsedMail<'_>) -> Result<Option<String>, MailParseError> {
    for part in &mail.subparts {
        if !part.subparts.is_empty() {
            if let Some(text) = find_text_part(part)? {
                return Ok(Some(text));
            }
        } else if part.ctype.mimetype == "text/plain" {
            return part.get_body().map(Some);
        }
    }
    Ok(None)
}

#[async_trait::async_trait]
impl Inbox for ImapInbox {
    async fn latest_text(&self, filter: &EmailFilter) -> Result<String, EmailError> {
        let inbox = self.clone();
        let query = search_query(filter);
        tokio::task::spawn_blocking(move || inbox.fetch_latest(&query)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_search_criteria() {
        assert_eq!(search_query(&EmailFilter::default()), "ALL");
        assert_eq!(
            search_query(&EmailFilter {
                sender: Some("no-reply@example.com".to_owned()),
                subject: Some("Your \"code\"".to_owned()),
            }),
            r#"FROM "no-reply@example.com" SUBJECT "Your \"code\"""#
        );
    }

    #[test]
    fn finds_plain_text_in_multipart() {
        let raw = concat!(
            "From: no-reply@example.com\r\n",
            "Subject: Code\r\n",
            "Content-Type: multipart/alternative; boundary=\"b\"\r\n",
            "\r\n",
            "--b\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>Your code: 123456</p>\r\n",
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "Your code: 123456\r\n",
            "--b--\r\n",
        );
        let parsed = mailparse::parse_mail(raw.as_bytes()).unwrap();

        let text = plain_text(&parsed).unwrap().unwrap();
        assert_eq!(text.trim(), "Your code: 123456");
    }

    #[test]
    fn single_part_body_is_used_as_is() {
        let raw = "Subject: Code\r\nContent-Type: text/plain\r\n\r\n654321\r\n";
        let parsed = mailparse::parse_mail(raw.as_bytes()).unwrap();
        assert_eq!(plain_text(&parsed).unwrap().unwrap().trim(), "654321");
    }

    #[test]
    fn reads_credentials_from_config() {
        let config = LibraryConfig {
            gmail: Some("tester@gmail.com".to_owned()),
            gmail_app_password: Some("app-password".to_owned()),
            ..Default::default()
        };
        let inbox = ImapInbox::from_config(&config).unwrap();
        assert_eq!(inbox.host, GMAIL_IMAP_HOST);
        assert!(!format!("{inbox:?}").contains("app-password"));

        assert!(ImapInbox::from_config(&LibraryConfig::default()).is_err());
    }
}
