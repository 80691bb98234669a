//! Acknowledgment documents returned to the provider.

/// Builds the body returned to the provider after a callback is accepted.
pub trait ReplyEncoder: Send + Sync {
    /// Content type of the encoded document.
    fn content_type(&self) -> &'static str;

    /// An acknowledgment that asks the provider to send nothing back.
    fn empty_reply(&self) -> String;
}

/// TwiML messaging responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwimlReplyEncoder;

impl ReplyEncoder for TwimlReplyEncoder {
    fn content_type(&self) -> &'static str {
        "text/xml"
    }

    fn empty_reply(&self) -> String {
        r#"<?xml version="1.0" encoding="UTF-8"?><Response />"#.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_twiml_reply() {
        let encoder = TwimlReplyEncoder;
        assert_eq!(encoder.content_type(), "text/xml");
        assert_eq!(
            encoder.empty_reply(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response />"
        );
    }
}
