//! File-based Handlebars templates.
//!
//! A template is a directory under the template root holding `subject.hbs`,
//! `html.hbs` and, optionally, `text.hbs`. Every file is rendered with the
//! request's [`TemplateLocals`], so templates read `{{data.display_id}}` or
//! `{{env.STORE_URL}}`.

use std::io::ErrorKind;
use std::path::{Component, Path};

use handlebars::Handlebars;

use crate::error::MailerError;
use crate::services::mailer::TemplateLocals;

/// A rendered message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

/// Renders template directories from disk on every call, so edits apply
/// without a restart.
pub struct TemplateRenderer {
    html: Handlebars<'static>,
    plain: Handlebars<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        let mut plain = Handlebars::new();
        plain.register_escape_fn(handlebars::no_escape);
        Self {
            html: Handlebars::new(),
            plain,
        }
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `root/template` and renders it with `locals`.
    #[tracing::instrument(skip(self, root, locals))]
    pub async fn render(
        &self,
        root: &Path,
        template: &str,
        locals: &TemplateLocals,
    ) -> Result<RenderedMail, MailerError> {
        let relative = Path::new(template);
        if template.is_empty()
            || !relative
                .components()
                .all(|part| matches!(part, Component::Normal(_)))
        {
            return Err(MailerError::Template(format!(
                "template name {template:?} must be a relative path"
            )));
        }

        let dir = root.join(relative);
        let subject = read_part(&dir, "subject.hbs")
            .await?
            .ok_or_else(|| missing(&dir, "subject.hbs"))?;
        let html = read_part(&dir, "html.hbs")
            .await?
            .ok_or_else(|| missing(&dir, "html.hbs"))?;
        let text = read_part(&dir, "text.hbs").await?;

        self.render_sources(&subject, &html, text.as_deref(), locals)
    }

    /// Renders template sources already in memory. Only the HTML part is
    /// escaped.
    pub fn render_sources(
        &self,
        subject: &str,
        html: &str,
        text: Option<&str>,
        locals: &TemplateLocals,
    ) -> Result<RenderedMail, MailerError> {
        let render = |engine: &Handlebars<'static>, source: &str| {
            engine
                .render_template(source, locals)
                .map_err(|err| MailerError::Template(err.to_string()))
        };

        Ok(RenderedMail {
            subject: render(&self.plain, subject)?.trim().to_string(),
            html: render(&self.html, html)?,
            text: text.map(|source| render(&self.plain, source)).transpose()?,
        })
    }
}

async fn read_part(dir: &Path, file: &str) -> Result<Option<String>, MailerError> {
    let path = dir.join(file);
    match tokio::fs::read_to_string(&path).await {
        Ok(source) => Ok(Some(source)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(MailerError::Template(format!("{}: {err}", path.display()))),
    }
}

fn missing(dir: &Path, file: &str) -> MailerError {
    MailerError::Template(format!("{} is missing", dir.join(file).display()))
}
