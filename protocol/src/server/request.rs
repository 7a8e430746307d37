//! JSON payload of `|request|` lines.
//!
//! Only the fields the client acts on are modelled; serde ignores the rest.

use serde::{Deserialize, Deserializer};

use super::battle::{HpStatus, Player, PokemonDetails};
use super::to_id;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRequest {
    /// Echoed back with the choice so the server can drop stale answers
    pub rqid: Option<u64>,
    #[serde(default)]
    pub active: Option<Vec<ActivePokemon>>,
    pub side: Option<SideInfo>,
    /// One flag per active slot
    #[serde(default)]
    pub force_switch: Option<Vec<bool>>,
    #[serde(default)]
    pub team_preview: bool,
    /// Nothing to choose until the opponent has chosen
    #[serde(default)]
    pub wait: bool,
}

impl BattleRequest {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn is_force_switch(&self) -> bool {
        self.force_switch
            .as_deref()
            .is_some_and(|slots| slots.contains(&true))
    }

    pub fn player(&self) -> Option<Player> {
        self.side.as_ref().and_then(|side| Player::parse(&side.id))
    }

    /// The active slot; singles has exactly one
    pub fn first_active(&self) -> Option<&ActivePokemon> {
        self.active.as_deref().and_then(<[_]>::first)
    }

    /// Benched, conscious members with their 1-based `/choose switch` slot
    pub fn available_switches(&self) -> Vec<(usize, &SidePokemon)> {
        let Some(side) = &self.side else {
            return Vec::new();
        };
        side.pokemon
            .iter()
            .zip(1..)
            .filter(|(member, _)| !member.active && !member.is_fainted())
            .map(|(member, slot)| (slot, member))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePokemon {
    #[serde(default)]
    pub moves: Vec<MoveSlot>,
    #[serde(default)]
    pub trapped: bool,
    #[serde(default)]
    pub can_mega_evo: bool,
    #[serde(default)]
    pub can_dynamax: bool,
    /// Tera type on offer, if terastallizing is still possible
    #[serde(default)]
    pub can_terastallize: Option<String>,
}

impl ActivePokemon {
    /// Selectable moves with their 1-based `/choose move` slot
    pub fn enabled_moves(&self) -> impl Iterator<Item = (usize, &MoveSlot)> {
        self.moves
            .iter()
            .zip(1..)
            .filter(|(slot, _)| !slot.disabled)
            .map(|(slot, index)| (index, slot))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoveSlot {
    #[serde(rename = "move")]
    pub name: String,
    #[serde(default)]
    pub id: String,
    /// Zero for pseudo-moves such as Recharge, which carry no PP
    #[serde(default)]
    pub pp: u32,
    #[serde(rename = "maxpp", default)]
    pub max_pp: u32,
    /// Sent as `true`/`false` or as the name of whatever disabled the move
    #[serde(default, deserialize_with = "truthy")]
    pub disabled: bool,
}

impl MoveSlot {
    /// The move id, derived from the name when the server leaves it out
    pub fn move_id(&self) -> String {
        if self.id.is_empty() {
            to_id(&self.name)
        } else {
            self.id.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SideInfo {
    #[serde(default)]
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub pokemon: Vec<SidePokemon>,
}

/// One member of our own team, as the server sees it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidePokemon {
    pub ident: String,
    pub details: String,
    /// `HP/MAX [STATUS]`, or `0 fnt`
    pub condition: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub moves: Vec<String>,
    #[serde(default)]
    pub base_ability: String,
    #[serde(default)]
    pub ability: String,
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub tera_type: Option<String>,
    /// Empty until the member terastallizes
    #[serde(default)]
    pub terastallized: Option<String>,
}

impl SidePokemon {
    pub fn is_fainted(&self) -> bool {
        self.condition.ends_with("fnt")
    }

    pub fn hp_status(&self) -> Option<HpStatus> {
        HpStatus::parse(&self.condition)
    }

    /// Ailment code from the condition, never "fnt"
    pub fn status(&self) -> Option<&str> {
        self.condition
            .split_whitespace()
            .nth(1)
            .filter(|code| *code != "fnt")
    }

    pub fn details(&self) -> PokemonDetails {
        PokemonDetails::parse(&self.details)
    }

    /// Nickname part of the ident: `p1: Sparky` gives `Sparky`
    pub fn name(&self) -> &str {
        self.ident
            .split_once(": ")
            .map_or(self.ident.as_str(), |(_, name)| name)
    }

    pub fn species(&self) -> &str {
        self.details.split(',').next().unwrap_or_default()
    }
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => false,
        Value::String(reason) => !reason.is_empty(),
        _ => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"{
        "active": [{
            "moves": [
                {"move": "Thunderbolt", "id": "thunderbolt", "pp": 24, "maxpp": 24, "target": "normal", "disabled": false},
                {"move": "Volt Switch", "id": "voltswitch", "pp": 0, "maxpp": 32, "target": "normal", "disabled": true},
                {"move": "Protect", "id": "protect", "pp": 16, "maxpp": 16, "target": "self", "disabled": "Taunt"},
                {"move": "Recharge"}
            ],
            "canTerastallize": "Electric"
        }],
        "side": {
            "name": "Alice",
            "id": "p1",
            "pokemon": [
                {"ident": "p1: Sparky", "details": "Pikachu, L88, M", "condition": "211/211", "active": true,
                 "stats": {"atk": 100, "def": 90, "spa": 120, "spd": 110, "spe": 200},
                 "moves": ["thunderbolt", "voltswitch", "protect"], "baseAbility": "static", "item": "lightball",
                 "ability": "static", "teraType": "Electric", "terastallized": ""},
                {"ident": "p1: Garchomp", "details": "Garchomp, L80, F", "condition": "0 fnt", "active": false,
                 "moves": ["earthquake"], "item": "", "ability": "roughskin"},
                {"ident": "p1: Gholdengo", "details": "Gholdengo, L82", "condition": "180/250 par", "active": false,
                 "moves": ["makeitrain"]}
            ]
        },
        "rqid": 7
    }"#;

    #[test]
    fn test_parse_request() {
        let request = BattleRequest::parse(REQUEST).unwrap();
        assert_eq!(request.rqid, Some(7));
        assert_eq!(request.player(), Some(Player::P1));
        assert!(!request.is_force_switch());

        let active = request.first_active().unwrap();
        assert_eq!(active.can_terastallize.as_deref(), Some("Electric"));
        let enabled: Vec<(usize, String)> = active
            .enabled_moves()
            .map(|(slot, m)| (slot, m.move_id()))
            .collect();
        assert_eq!(
            enabled,
            vec![(1, "thunderbolt".to_string()), (4, "recharge".to_string())]
        );
    }

    #[test]
    fn test_available_switches_skip_active_and_fainted() {
        let request = BattleRequest::parse(REQUEST).unwrap();
        let switches = request.available_switches();
        assert_eq!(switches.len(), 1);
        assert_eq!(switches[0].0, 3);
        assert_eq!(switches[0].1.name(), "Gholdengo");
        assert_eq!(switches[0].1.status(), Some("par"));
    }

    #[test]
    fn test_side_pokemon_fields() {
        let request = BattleRequest::parse(REQUEST).unwrap();
        let side = request.side.unwrap();
        let sparky = &side.pokemon[0];
        assert_eq!(sparky.species(), "Pikachu");
        assert_eq!(sparky.name(), "Sparky");
        assert_eq!(sparky.tera_type.as_deref(), Some("Electric"));
        assert_eq!(sparky.details().level, Some(88));
        assert!(side.pokemon[1].is_fainted());
        assert_eq!(side.pokemon[1].status(), None);
    }

    #[test]
    fn test_force_switch_and_wait() {
        let forced = BattleRequest::parse(
            r#"{"forceSwitch": [true], "side": {"id": "p2", "pokemon": []}, "rqid": 3}"#,
        )
        .unwrap();
        assert!(forced.is_force_switch());
        assert!(forced.first_active().is_none());

        let waiting = BattleRequest::parse(r#"{"wait": true, "side": {"name": "Bob", "id": "p2", "pokemon": []}}"#)
            .unwrap();
        assert!(waiting.wait);
        assert!(!waiting.is_force_switch());
        assert_eq!(waiting.player(), Some(Player::P2));
    }
}
