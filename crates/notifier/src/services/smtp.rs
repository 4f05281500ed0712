//! SMTP delivery through lettre.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use serde_json::Value;

use crate::config::NotifierConfig;
use crate::error::{MailerError, NotifierError, Result};
use crate::services::mailer::{MailAttachment, Mailer, SendRequest};
use crate::services::templates::{RenderedMail, TemplateRenderer};

/// SMTP server settings, named like the transport options of Node mailers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpSettings {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    /// TLS from the first byte, usually on port 465.
    #[serde(default)]
    pub secure: bool,
    /// Refuse servers that do not offer STARTTLS.
    #[serde(default, rename = "requireTLS")]
    pub require_tls: bool,
    /// Never upgrade to TLS.
    #[serde(default, rename = "ignoreTLS")]
    pub ignore_tls: bool,
    #[serde(default)]
    pub auth: Option<SmtpAuth>,
    /// Milliseconds to wait on the server.
    #[serde(default)]
    pub connection_timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SmtpAuth {
    pub user: String,
    pub pass: String,
}

/// The configured transport: an `smtp://` / `smtps://` URL or settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TransportOptions {
    Url(String),
    Settings(SmtpSettings),
}

impl TransportOptions {
    /// Reads the transport out of the `transport` config value.
    pub fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Err(NotifierError::Config(
                "SMTP_TRANSPORT is not set; no mail can be delivered".to_string(),
            ));
        }
        serde_json::from_value(value.clone())
            .map_err(|err| NotifierError::Config(format!("SMTP_TRANSPORT is invalid: {err}")))
    }

    fn build(
        &self,
    ) -> std::result::Result<AsyncSmtpTransport<Tokio1Executor>, lettre::transport::smtp::Error>
    {
        let settings = match self {
            Self::Url(url) => {
                return Ok(AsyncSmtpTransport::<Tokio1Executor>::from_url(url)?.build());
            }
            Self::Settings(settings) => settings,
        };

        let mut builder = if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
        } else if settings.require_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
        } else if settings.ignore_tls {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host).tls(
                Tls::Opportunistic(TlsParameters::new(settings.host.clone())?),
            )
        };
        if let Some(port) = settings.port {
            builder = builder.port(port);
        }
        if let Some(auth) = &settings.auth {
            builder = builder.credentials(Credentials::new(auth.user.clone(), auth.pass.clone()));
        }
        if let Some(ms) = settings.connection_timeout {
            builder = builder.timeout(Some(Duration::from_millis(ms)));
        }
        Ok(builder.build())
    }
}

/// Renders file templates and delivers them over SMTP.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    renderer: TemplateRenderer,
}

impl SmtpMailer {
    pub fn new(transport: AsyncSmtpTransport<Tokio1Executor>) -> Self {
        Self {
            transport,
            renderer: TemplateRenderer::new(),
        }
    }

    pub fn from_options(options: &TransportOptions) -> Result<Self> {
        let transport = options
            .build()
            .map_err(|err| NotifierError::Config(format!("SMTP transport: {err}")))?;
        Ok(Self::new(transport))
    }

    /// Builds the mailer from `config.transport`. Fails when it is unset.
    pub fn from_config(config: &NotifierConfig) -> Result<Self> {
        Self::from_options(&TransportOptions::from_value(&config.transport)?)
    }

    /// Opens and closes one connection to the server.
    pub async fn test_connection(&self) -> std::result::Result<bool, MailerError> {
        self.transport
            .test_connection()
            .await
            .map_err(|err| MailerError::Transport(err.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[tracing::instrument(skip(self, request), fields(template = %request.template))]
    async fn send(&self, request: &SendRequest) -> std::result::Result<(), MailerError> {
        if request.to.as_deref().is_none_or(str::is_empty) {
            return Err(MailerError::MissingRecipient);
        }

        let rendered = self
            .renderer
            .render(&request.template_root, &request.template, &request.locals)
            .await?;
        let message = build_message(request, rendered)?;

        let response = self.transport.send(message).await.map_err(|err| {
            if err.is_permanent() {
                MailerError::Rejected(err.to_string())
            } else {
                MailerError::Transport(err.to_string())
            }
        })?;
        tracing::debug!(code = %response.code(), "SMTP server accepted message");
        Ok(())
    }
}

/// Assembles the MIME message for `request` from its rendered body.
pub fn build_message(
    request: &SendRequest,
    rendered: RenderedMail,
) -> std::result::Result<Message, MailerError> {
    let to = request
        .to
        .as_deref()
        .filter(|to| !to.is_empty())
        .ok_or(MailerError::MissingRecipient)?;
    let from = parse_mailbox(&request.from)?;
    let to = parse_mailbox(to)?;

    let body = match rendered.text {
        Some(text) => MultiPart::alternative_plain_html(text, rendered.html),
        None => MultiPart::alternative().singlepart(SinglePart::html(rendered.html)),
    };
    let mut content = MultiPart::mixed().multipart(body);
    for attachment in &request.attachments {
        content = content.singlepart(attachment_part(attachment)?);
    }

    Message::builder()
        .from(from)
        .to(to)
        .subject(rendered.subject)
        .multipart(content)
        .map_err(|err| MailerError::Transport(err.to_string()))
}

fn parse_mailbox(address: &str) -> std::result::Result<Mailbox, MailerError> {
    address
        .parse()
        .map_err(|err| MailerError::Address(format!("{address}: {err}")))
}

fn attachment_part(attachment: &MailAttachment) -> std::result::Result<SinglePart, MailerError> {
    let body = BASE64.decode(attachment.content.as_bytes()).map_err(|err| {
        MailerError::Transport(format!("attachment {} is not base64: {err}", attachment.filename))
    })?;
    let content_type = ContentType::parse(&attachment.mime_type).map_err(|err| {
        MailerError::Transport(format!(
            "attachment {} has type {:?}: {err}",
            attachment.filename, attachment.mime_type
        ))
    })?;

    let part = if attachment.disposition == "inline" {
        MimeAttachment::new_inline(attachment.content_id.clone())
    } else {
        MimeAttachment::new(attachment.filename.clone())
    };
    Ok(part.body(body, content_type))
}
