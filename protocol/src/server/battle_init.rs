//! Battle initialization message parsers
//!
//! These messages are sent at the start of a battle to set up the game state.

use super::EventKind;
use super::battle::{GameType, PokemonDetails, parse_side, required};
use crate::ParseError;
use anyhow::Result;

/// Parse |player|PLAYER|USERNAME|AVATAR|RATING
pub fn parse_player(parts: &[&str]) -> Result<EventKind> {
    let side = parse_side(parts, 2)?;
    let username = parts.get(3).unwrap_or(&"").to_string();
    let avatar = parts
        .get(4)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    let rating = parts.get(5).and_then(|s| s.parse().ok());

    Ok(EventKind::Player {
        side,
        username,
        avatar,
        rating,
    })
}

/// Parse |teamsize|PLAYER|NUMBER
pub fn parse_teamsize(parts: &[&str]) -> Result<EventKind> {
    let side = parse_side(parts, 2)?;
    let size = parts
        .get(3)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParseError::MissingField("team size".to_string()))?;

    Ok(EventKind::TeamSize { side, size })
}

/// Parse |gen|GENNUM
pub fn parse_gen(parts: &[&str]) -> Result<EventKind> {
    let generation = parts
        .get(2)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParseError::MissingField("generation".to_string()))?;

    Ok(EventKind::Gen(generation))
}

/// Parse |tier|FORMATNAME
pub fn parse_tier(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Tier(required(parts, 2, "tier")?))
}

/// Parse |gametype|GAMETYPE
pub fn parse_gametype(parts: &[&str]) -> Result<EventKind> {
    let game_type = parts
        .get(2)
        .and_then(|s| GameType::parse(s))
        .ok_or_else(|| ParseError::InvalidFormat("unrecognized game type".to_string()))?;

    Ok(EventKind::GameType(game_type))
}

/// Parse |poke|PLAYER|DETAILS|ITEM
pub fn parse_poke(parts: &[&str]) -> Result<EventKind> {
    let side = parse_side(parts, 2)?;
    let details = PokemonDetails::parse(&required(parts, 3, "details")?);
    let has_item = parts.get(4).is_some_and(|s| *s == "item");

    Ok(EventKind::Poke {
        side,
        details,
        has_item,
    })
}

/// Parse |clearpoke
pub fn parse_clearpoke(_parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::ClearPoke)
}
