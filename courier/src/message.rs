use serde::Serialize;

/// A message handed to the delivery provider. The provider owns templates,
/// retries and channel routing; the backend only supplies typed payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "channel", rename_all = "camelCase")]
pub enum Message {
    #[serde(rename_all = "camelCase")]
    Email {
        to: String,
        subject: String,
        body: String,
    },
    #[serde(rename_all = "camelCase")]
    Sms { to: String, body: String },
    #[serde(rename_all = "camelCase")]
    Push {
        /// Opaque recipient handle, resolved to device tokens by the provider.
        recipient: String,
        title: String,
        body: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reference: Option<String>,
    },
}

impl Message {
    pub fn email(
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Message::Email {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn sms(to: impl Into<String>, body: impl Into<String>) -> Self {
        Message::Sms {
            to: to.into(),
            body: body.into(),
        }
    }

    pub fn push(
        recipient: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Message::Push {
            recipient: recipient.into(),
            title: title.into(),
            body: body.into(),
            reference: None,
        }
    }

    /// Attach an application reference (e.g. a booking id) to a push message.
    /// No-op for other channels.
    pub fn with_reference(self, reference: impl Into<String>) -> Self {
        match self {
            Message::Push {
                recipient,
                title,
                body,
                ..
            } => Message::Push {
                recipient,
                title,
                body,
                reference: Some(reference.into()),
            },
            other => other,
        }
    }

    /// Short human-readable label used in log lines.
    pub fn channel(&self) -> &'static str {
        match self {
            Message::Email { .. } => "email",
            Message::Sms { .. } => "sms",
            Message::Push { .. } => "push",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_serializes_with_channel_tag() {
        let message = Message::email("ada@example.com", "Booking confirmed", "See you soon");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["channel"], "email");
        assert_eq!(json["to"], "ada@example.com");
        assert_eq!(json["subject"], "Booking confirmed");
    }

    #[test]
    fn push_reference_is_omitted_when_absent() {
        let message = Message::push("user-1", "title", "body");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["channel"], "push");
        assert!(json.get("reference").is_none());
    }

    #[test]
    fn push_reference_round_trips() {
        let message = Message::push("user-1", "title", "body").with_reference("BK123");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["reference"], "BK123");
    }

    #[test]
    fn with_reference_leaves_sms_untouched() {
        let message = Message::sms("+4670000000", "hello").with_reference("BK123");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["channel"], "sms");
        assert!(json.get("reference").is_none());
    }
}
