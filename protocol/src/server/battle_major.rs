//! Major battle action message parsers
//!
//! These are the primary actions in battle: moves, switches, faints, etc.

use super::EventKind;
use super::battle::{
    PokemonDetails, PokemonIdent, annotation, has_flag, parse_hp_status, parse_pokemon,
    positional, required,
};
use anyhow::Result;

/// Parse |move|POKEMON|MOVE|TARGET with optional tags
pub fn parse_move(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let move_name = required(parts, 3, "move")?;
    let target = positional(parts, 4).and_then(PokemonIdent::parse);

    Ok(EventKind::Move {
        pokemon,
        move_name,
        target,
        from: annotation(parts, "from").map(str::to_string),
        spread: has_flag(parts, "spread"),
        miss: has_flag(parts, "miss"),
        still: has_flag(parts, "still"),
        anim: annotation(parts, "anim").map(str::to_string),
    })
}

/// POKEMON|DETAILS|HP STATUS, shared by the switch-like messages
fn parse_appearance(
    parts: &[&str],
) -> Result<(PokemonIdent, PokemonDetails, Option<super::HpStatus>)> {
    let pokemon = parse_pokemon(parts, 2)?;
    let details = PokemonDetails::parse(&required(parts, 3, "details")?);
    let hp = parse_hp_status(parts, 4);
    Ok((pokemon, details, hp))
}

/// Parse |switch|POKEMON|DETAILS|HP STATUS
pub fn parse_switch(parts: &[&str]) -> Result<EventKind> {
    let (pokemon, details, hp) = parse_appearance(parts)?;
    Ok(EventKind::Switch {
        pokemon,
        details,
        hp,
    })
}

/// Parse |drag|POKEMON|DETAILS|HP STATUS
pub fn parse_drag(parts: &[&str]) -> Result<EventKind> {
    let (pokemon, details, hp) = parse_appearance(parts)?;
    Ok(EventKind::Drag {
        pokemon,
        details,
        hp,
    })
}

/// Parse |replace|POKEMON|DETAILS|HP STATUS
pub fn parse_replace(parts: &[&str]) -> Result<EventKind> {
    let (pokemon, details, hp) = parse_appearance(parts)?;
    Ok(EventKind::Replace {
        pokemon,
        details,
        hp,
    })
}

/// Parse |detailschange|POKEMON|DETAILS|HP STATUS
pub fn parse_detailschange(parts: &[&str]) -> Result<EventKind> {
    let (pokemon, details, hp) = parse_appearance(parts)?;
    Ok(EventKind::DetailsChange {
        pokemon,
        details,
        hp,
    })
}

/// Parse |cant|POKEMON|REASON or |cant|POKEMON|REASON|MOVE
pub fn parse_cant(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let reason = parts.get(3).unwrap_or(&"").to_string();
    let move_name = positional(parts, 4).map(str::to_string);

    Ok(EventKind::Cant {
        pokemon,
        reason,
        move_name,
    })
}

/// Parse |faint|POKEMON
pub fn parse_faint(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    Ok(EventKind::Faint { pokemon })
}
