//! Delivery and document capabilities.
//!
//! [`SmtpMailer`] delivers real mail; the in-memory implementations back
//! the tests.

pub mod fulfillment;
pub mod invoice;
pub mod mailer;
pub mod smtp;
pub mod templates;

pub use fulfillment::{
    Document, DocumentKind, FulfillmentProvider, InMemoryFulfillmentProvider,
    UnconfiguredFulfillmentProvider,
};
pub use invoice::{InMemoryInvoiceGenerator, InvoiceGenerator};
pub use mailer::{InMemoryMailer, MailAttachment, Mailer, SendRequest, TemplateLocals};
pub use smtp::{SmtpAuth, SmtpMailer, SmtpSettings, TransportOptions};
pub use templates::{RenderedMail, TemplateRenderer};
