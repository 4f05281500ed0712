//! Delivery side of the notification pipeline.
//!
//! - [`NotificationAssembler`] gates events on a template, enriches them and
//!   hands the result to a [`Mailer`]; [`SmtpMailer`] delivers over SMTP
//! - [`AttachmentResolver`] adds return labels and invoices
//! - [`NotificationSubscriber`] is the bus entry point; it never fails and
//!   records every attempted send in a notification store

pub mod assembler;
pub mod attachments;
pub mod config;
pub mod error;
pub mod services;
pub mod subscriber;

pub use assembler::{
    NotificationAssembler, NotificationOutcome, NotificationStatus, ResendOverrides,
    SendEmailOptions,
};
pub use attachments::{Attachment, AttachmentResolver};
pub use config::NotifierConfig;
pub use error::{CapabilityError, MailerError, NotifierError, Result};
pub use services::{
    Document, DocumentKind, FulfillmentProvider, InMemoryFulfillmentProvider,
    InMemoryInvoiceGenerator, InMemoryMailer, InvoiceGenerator, MailAttachment, Mailer,
    RenderedMail, SendRequest, SmtpAuth, SmtpMailer, SmtpSettings, TemplateLocals,
    TemplateRenderer, TransportOptions, UnconfiguredFulfillmentProvider,
};
pub use subscriber::NotificationSubscriber;
