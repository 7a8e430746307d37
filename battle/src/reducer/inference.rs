//! Legal actions inferred from tracked state alone.
//!
//! The server's request is always authoritative; these exist to cross-check
//! it and to answer the question in replays, where no requests arrive.

use crate::types::{TeamState, Volatile};

/// Move ids the active Pokemon can select
pub fn infer_moves(team: &TeamState) -> Vec<String> {
    let Some(active) = team.active() else {
        return Vec::new();
    };

    if active.has_volatile(&Volatile::Recharging) {
        return vec!["recharge".to_string()];
    }

    if let Some(locked) = active.volatiles.iter().find_map(Volatile::locked_move) {
        return vec![locked.to_string()];
    }

    if active.has_volatile(&Volatile::Thrash) || active.has_volatile(&Volatile::Encore) {
        if let Some(last) = &active.last_move {
            return vec![last.clone()];
        }
    }

    active.usable_moves().map(|m| m.id.clone()).collect()
}

/// Species ids of Pokemon that can be switched in. Trapping only applies
/// when the switch is voluntary.
pub fn infer_switches(team: &TeamState, force_switch: bool) -> Vec<String> {
    let trapped = team
        .active()
        .is_some_and(|p| p.volatiles.iter().any(Volatile::prevents_switching));
    if trapped && !force_switch {
        return Vec::new();
    }

    team.bench()
        .map(|(_, p)| volley_protocol::to_id(&p.identity.species))
        .collect()
}
