use super::EventKind;
use crate::ParseError;
use anyhow::Result;

/// Parse |pm|SENDER|RECEIVER|MESSAGE
pub fn parse_pm(parts: &[&str]) -> Result<EventKind> {
    if parts.len() < 5 {
        return Err(ParseError::MissingField("pm fields".to_string()).into());
    }

    // MESSAGE can contain | characters
    Ok(EventKind::PrivateMessage {
        sender: parts[2].trim().to_string(),
        recipient: parts[3].trim().to_string(),
        message: parts[4..].join("|"),
    })
}

/// Parse |popup|MESSAGE
pub fn parse_popup(parts: &[&str]) -> Result<EventKind> {
    if parts.len() < 3 {
        return Err(ParseError::MissingField("popup message".to_string()).into());
    }

    Ok(EventKind::Popup {
        text: parts[2..].join("|"),
    })
}

/// Parse |error|MESSAGE
pub fn parse_error(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Error {
        text: parts.get(2..).map(|rest| rest.join("|")).unwrap_or_default(),
    })
}
