//! Account events. Their payloads already hold everything a template needs.

use crate::context::TemplateContext;
use crate::error::Result;
use crate::event::{CustomerPasswordResetData, InviteCreatedData, UserPasswordResetData};

pub fn user_password_reset(data: &UserPasswordResetData) -> Result<TemplateContext> {
    Ok(TemplateContext::builder().spread("payload", data)?.build())
}

pub fn customer_password_reset(data: &CustomerPasswordResetData) -> Result<TemplateContext> {
    Ok(TemplateContext::builder().spread("payload", data)?.build())
}

/// The invitee's address is exposed as `email` so the mail can be addressed.
pub fn invite_created(data: &InviteCreatedData) -> Result<TemplateContext> {
    Ok(TemplateContext::builder()
        .field("email", &data.user_email)?
        .spread("payload", data)?
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    #[test]
    fn invite_exposes_email() {
        let data = InviteCreatedData {
            id: "invite_1".into(),
            token: "tok".into(),
            user_email: "new@example.com".into(),
            extra: Map::new(),
        };
        let context = invite_created(&data).unwrap();
        assert_eq!(context.email(), Some("new@example.com"));
        assert_eq!(context.get("user_email"), Some(&json!("new@example.com")));
        assert_eq!(context.get("token"), Some(&json!("tok")));
    }

    #[test]
    fn password_reset_is_verbatim() {
        let payload = json!({"email": "a@b.c", "token": "t", "first_seen": 3});
        let data: UserPasswordResetData = serde_json::from_value(payload.clone()).unwrap();
        let context = user_password_reset(&data).unwrap();
        assert_eq!(context.into_value(), payload);
    }
}
