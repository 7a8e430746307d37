//! Battle progress message parsers
//!
//! These messages track the flow of a battle: turns, end of battle, and the
//! decision requests sent to the player.

use super::EventKind;
use crate::ParseError;
use anyhow::Result;

/// Parse |turn|NUMBER
pub fn parse_turn(parts: &[&str]) -> Result<EventKind> {
    let number = parts
        .get(2)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParseError::MissingField("turn number".to_string()))?;

    Ok(EventKind::Turn { number })
}

/// Parse |start
pub fn parse_start(_parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Start)
}

/// Parse |win|USER
pub fn parse_win(parts: &[&str]) -> Result<EventKind> {
    let winner = parts.get(2).unwrap_or(&"").to_string();
    Ok(EventKind::Win { winner })
}

/// Parse |tie
pub fn parse_tie(_parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Tie)
}

/// Parse |upkeep
pub fn parse_upkeep(_parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Upkeep)
}

/// Parse |request|REQUEST
///
/// The JSON payload may itself contain `|`, so everything after the tag is
/// rejoined. An empty request (sent when no decision is needed) is kept as-is.
pub fn parse_request(parts: &[&str]) -> Result<EventKind> {
    let json = parts.get(2..).map(|rest| rest.join("|")).unwrap_or_default();
    Ok(EventKind::Request { json })
}

/// Parse |teampreview or |teampreview|NUMBER
pub fn parse_teampreview(parts: &[&str]) -> Result<EventKind> {
    let count = parts.get(2).and_then(|s| s.parse().ok());
    Ok(EventKind::TeamPreview { count })
}
