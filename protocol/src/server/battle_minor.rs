//! Minor battle action message parsers
//!
//! These are secondary effects in battle: damage, stat changes, status, etc.
//! In the official client, they're usually displayed in smaller font.

use super::EventKind;
use super::battle::{
    PokemonIdent, Stat, annotation, has_flag, parse_hp_status, parse_pokemon, parse_side,
    positional, required,
};
use crate::ParseError;
use anyhow::Result;

fn parse_of(parts: &[&str]) -> Option<PokemonIdent> {
    annotation(parts, "of").and_then(PokemonIdent::parse)
}

fn parse_from(parts: &[&str]) -> Option<String> {
    annotation(parts, "from").map(str::to_string)
}

/// POKEMON|STAT|AMOUNT, shared by the stage messages
fn parse_stage_change(parts: &[&str]) -> Result<(PokemonIdent, Stat, i8)> {
    let pokemon = parse_pokemon(parts, 2)?;
    let stat = parts
        .get(3)
        .and_then(|s| Stat::parse(s))
        .ok_or_else(|| ParseError::MissingField("stat".to_string()))?;
    let amount = parts
        .get(4)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParseError::MissingField("amount".to_string()))?;

    Ok((pokemon, stat, amount))
}

/// Parse |-damage|POKEMON|HP STATUS
pub fn parse_damage(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Damage {
        pokemon: parse_pokemon(parts, 2)?,
        hp: parse_hp_status(parts, 3),
        from: parse_from(parts),
        of: parse_of(parts),
    })
}

/// Parse |-heal|POKEMON|HP STATUS
pub fn parse_heal(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Heal {
        pokemon: parse_pokemon(parts, 2)?,
        hp: parse_hp_status(parts, 3),
        from: parse_from(parts),
        of: parse_of(parts),
    })
}

/// Parse |-sethp|POKEMON|HP
pub fn parse_sethp(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::SetHp {
        pokemon: parse_pokemon(parts, 2)?,
        hp: parse_hp_status(parts, 3),
    })
}

/// Parse |-status|POKEMON|STATUS
pub fn parse_status(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Status {
        pokemon: parse_pokemon(parts, 2)?,
        status: required(parts, 3, "status")?,
        from: parse_from(parts),
    })
}

/// Parse |-curestatus|POKEMON|STATUS
pub fn parse_curestatus(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::CureStatus {
        pokemon: parse_pokemon(parts, 2)?,
        status: parts.get(3).unwrap_or(&"").to_string(),
    })
}

/// Parse |-cureteam|POKEMON
pub fn parse_cureteam(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::CureTeam {
        pokemon: parse_pokemon(parts, 2)?,
    })
}

/// Parse |-boost|POKEMON|STAT|AMOUNT
pub fn parse_boost(parts: &[&str]) -> Result<EventKind> {
    let (pokemon, stat, amount) = parse_stage_change(parts)?;
    Ok(EventKind::Boost {
        pokemon,
        stat,
        amount,
    })
}

/// Parse |-unboost|POKEMON|STAT|AMOUNT
pub fn parse_unboost(parts: &[&str]) -> Result<EventKind> {
    let (pokemon, stat, amount) = parse_stage_change(parts)?;
    Ok(EventKind::Unboost {
        pokemon,
        stat,
        amount,
    })
}

/// Parse |-setboost|POKEMON|STAT|AMOUNT
pub fn parse_setboost(parts: &[&str]) -> Result<EventKind> {
    let (pokemon, stat, stage) = parse_stage_change(parts)?;
    Ok(EventKind::SetBoost {
        pokemon,
        stat,
        stage,
    })
}

/// Parse |-clearboost|POKEMON
pub fn parse_clearboost(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::ClearBoost {
        pokemon: parse_pokemon(parts, 2)?,
    })
}

/// Parse |-clearallboost
pub fn parse_clearallboost(_parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::ClearAllBoost)
}

/// Parse |-clearnegativeboost|POKEMON
pub fn parse_clearnegativeboost(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::ClearNegativeBoost {
        pokemon: parse_pokemon(parts, 2)?,
    })
}

/// Parse |-clearpositiveboost|TARGET|POKEMON|EFFECT
pub fn parse_clearpositiveboost(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::ClearPositiveBoost {
        pokemon: parse_pokemon(parts, 2)?,
    })
}

/// Parse |-invertboost|POKEMON
pub fn parse_invertboost(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::InvertBoost {
        pokemon: parse_pokemon(parts, 2)?,
    })
}

/// Parse |-ability|POKEMON|ABILITY
pub fn parse_ability(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Ability {
        pokemon: parse_pokemon(parts, 2)?,
        ability: required(parts, 3, "ability")?,
        from: parse_from(parts),
    })
}

/// Parse |-endability|POKEMON
pub fn parse_endability(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::EndAbility {
        pokemon: parse_pokemon(parts, 2)?,
    })
}

/// Parse |-item|POKEMON|ITEM
pub fn parse_item(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Item {
        pokemon: parse_pokemon(parts, 2)?,
        item: required(parts, 3, "item")?,
        from: parse_from(parts),
    })
}

/// Parse |-enditem|POKEMON|ITEM
pub fn parse_enditem(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::EndItem {
        pokemon: parse_pokemon(parts, 2)?,
        item: parts.get(3).unwrap_or(&"").to_string(),
        from: parse_from(parts),
    })
}

/// Parse |-start|POKEMON|EFFECT
pub fn parse_start_volatile(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::StartVolatile {
        pokemon: parse_pokemon(parts, 2)?,
        effect: required(parts, 3, "effect")?,
        silent: has_flag(parts, "silent"),
    })
}

/// Parse |-end|POKEMON|EFFECT
pub fn parse_end_volatile(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::EndVolatile {
        pokemon: parse_pokemon(parts, 2)?,
        effect: required(parts, 3, "effect")?,
        silent: has_flag(parts, "silent"),
    })
}

/// Parse |-mustrecharge|POKEMON
///
/// Surfaced as a silent volatile start so the recharge lock is tracked like
/// any other condition.
pub fn parse_mustrecharge(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::StartVolatile {
        pokemon: parse_pokemon(parts, 2)?,
        effect: "mustrecharge".to_string(),
        silent: true,
    })
}

/// Parse |-singleturn|POKEMON|MOVE
pub fn parse_singleturn(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::SingleTurn {
        pokemon: parse_pokemon(parts, 2)?,
        effect: parts.get(3).unwrap_or(&"").to_string(),
    })
}

/// Parse |-singlemove|POKEMON|MOVE
pub fn parse_singlemove(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::SingleMove {
        pokemon: parse_pokemon(parts, 2)?,
        effect: parts.get(3).unwrap_or(&"").to_string(),
    })
}

/// Parse |-weather|WEATHER with optional [upkeep] tag
pub fn parse_weather(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Weather {
        weather: required(parts, 2, "weather")?,
        upkeep: has_flag(parts, "upkeep"),
        from: parse_from(parts),
    })
}

/// Parse |-fieldstart|CONDITION
pub fn parse_fieldstart(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::FieldStart {
        condition: required(parts, 2, "condition")?,
        from: parse_from(parts),
    })
}

/// Parse |-fieldend|CONDITION
pub fn parse_fieldend(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::FieldEnd {
        condition: required(parts, 2, "condition")?,
    })
}

/// Parse |-sidestart|SIDE|CONDITION
pub fn parse_sidestart(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::SideStart {
        side: parse_side(parts, 2)?,
        condition: required(parts, 3, "condition")?,
    })
}

/// Parse |-sideend|SIDE|CONDITION
pub fn parse_sideend(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::SideEnd {
        side: parse_side(parts, 2)?,
        condition: required(parts, 3, "condition")?,
        from: parse_from(parts),
    })
}

/// Parse |-terastallize|POKEMON|TYPE
pub fn parse_terastallize(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Terastallize {
        pokemon: parse_pokemon(parts, 2)?,
        tera_type: required(parts, 3, "tera type")?,
    })
}

/// Parse |-formechange|POKEMON|SPECIES|HP STATUS
pub fn parse_formechange(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::FormeChange {
        pokemon: parse_pokemon(parts, 2)?,
        species: required(parts, 3, "species")?,
        hp: parse_hp_status(parts, 4),
    })
}

/// Parse |-transform|POKEMON|TARGET
pub fn parse_transform(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Transform {
        pokemon: parse_pokemon(parts, 2)?,
        target: parse_pokemon(parts, 3)?,
    })
}

/// Parse |-mega|POKEMON|MEGASTONE
pub fn parse_mega(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Mega {
        pokemon: parse_pokemon(parts, 2)?,
        megastone: positional(parts, 4)
            .or_else(|| positional(parts, 3))
            .map(str::to_string),
    })
}

/// Parse |-activate|POKEMON|EFFECT
pub fn parse_activate(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Activate {
        pokemon: parts.get(2).and_then(|s| PokemonIdent::parse(s)),
        effect: parts.get(3).unwrap_or(&"").to_string(),
    })
}

/// Parse |-prepare|ATTACKER|MOVE|DEFENDER
pub fn parse_prepare(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Prepare {
        pokemon: parse_pokemon(parts, 2)?,
        move_name: required(parts, 3, "move")?,
        target: positional(parts, 4).and_then(PokemonIdent::parse),
    })
}

/// Parse |-supereffective|POKEMON
pub fn parse_supereffective(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::SuperEffective {
        pokemon: parse_pokemon(parts, 2)?,
    })
}

/// Parse |-resisted|POKEMON
pub fn parse_resisted(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Resisted {
        pokemon: parse_pokemon(parts, 2)?,
    })
}

/// Parse |-immune|POKEMON
pub fn parse_immune(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Immune {
        pokemon: parse_pokemon(parts, 2)?,
    })
}

/// Parse |-crit|POKEMON
pub fn parse_crit(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Crit {
        pokemon: parse_pokemon(parts, 2)?,
    })
}

/// Parse |-miss|SOURCE|TARGET
pub fn parse_miss(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Miss {
        source: parse_pokemon(parts, 2)?,
        target: positional(parts, 3).and_then(PokemonIdent::parse),
    })
}

/// Parse |-fail|POKEMON|ACTION
pub fn parse_fail(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Fail {
        pokemon: parse_pokemon(parts, 2)?,
        action: positional(parts, 3).map(str::to_string),
    })
}

/// Parse |-hitcount|POKEMON|NUM
pub fn parse_hitcount(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let count = parts
        .get(3)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParseError::MissingField("hit count".to_string()))?;

    Ok(EventKind::HitCount { pokemon, count })
}
