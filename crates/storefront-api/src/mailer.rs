use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Outbound mail transport.
pub enum Mailer {
    /// Transactional mail API reached over HTTPS.
    Http(HttpMailer),
    /// Writes the message to the log instead of sending it.
    Log,
    /// Keeps messages in memory; handy for tests and offline runs.
    Memory(Outbox),
}

impl Mailer {
    pub async fn send(&self, mail: OutgoingMail) -> Result<()> {
        match self {
            Mailer::Http(http) => http.send(&mail).await,
            Mailer::Log => {
                info!("Mail to {} ({}):\n{}", mail.to, mail.subject, mail.html);
                Ok(())
            }
            Mailer::Memory(outbox) => {
                outbox.push(mail);
                Ok(())
            }
        }
    }
}

/// Shared in-memory mailbox backing `Mailer::Memory`.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    inner: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, mail: OutgoingMail) {
        let mut messages = self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("Outbox lock poisoned; recovering to record mail to {}", mail.to);
            poisoned.into_inner()
        });
        messages.push(mail);
    }

    pub fn messages(&self) -> Vec<OutgoingMail> {
        match self.inner.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last_to(&self, address: &str) -> Option<OutgoingMail> {
        self.messages().into_iter().rev().find(|m| m.to == address)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MailAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailBody<'a> {
    sender: MailAddress<'a>,
    to: Vec<MailAddress<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_email: String,
    from_name: Option<String>,
}

impl HttpMailer {
    pub fn new(
        api_url: String,
        api_key: String,
        from_email: String,
        from_name: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            from_email,
            from_name,
        }
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let body = SendMailBody {
            sender: MailAddress {
                email: &self.from_email,
                name: self.from_name.as_deref(),
            },
            to: vec![MailAddress {
                email: &mail.to,
                name: None,
            }],
            subject: &mail.subject,
            html_content: &mail.html,
        };

        let resp = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let text = resp.text().await.unwrap_or_default();
        bail!("Mail API send failed (status={}): {}", status, text)
    }
}

/// Verification message: subject is the site name, body links to
/// `{site_url}/verification/email?token=…`.
pub fn verification_mail(to: &str, site_name: &str, verify_url: &str) -> OutgoingMail {
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
</head>
<body>
    <div style="display: flex; align-items: center; flex-direction: column">
        <h3>Account Verification</h3>
        <br>
        <p>Thanks for choosing {site}, please click on the button below to verify your account</p>
        <a style="margin-top: 1rem; padding: 1rem; border-radius: 0.5rem; font-size: 1rem; text-decoration: none; background: #0275d8; color: white"
           href="{url}">
            Verify your email
        </a>
    </div>
</body>
</html>
"#,
        site = escape_html(site_name),
        url = escape_html(verify_url),
    );

    OutgoingMail {
        to: to.to_string(),
        subject: site_name.to_string(),
        html,
    }
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
