//! Value types that appear inside protocol lines, and the argument helpers
//! the line parsers share.

use std::fmt;

use crate::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Player {
    P1,
    P2,
    P3,
    P4,
}

impl Player {
    const IDS: [(&'static str, Player); 4] = [
        ("p1", Player::P1),
        ("p2", Player::P2),
        ("p3", Player::P3),
        ("p4", Player::P4),
    ];

    /// Reads the leading side id, so "p1", "p1a" and "p1: Alice" all work
    pub fn parse(s: &str) -> Option<Self> {
        let prefix = s.get(..2)?;
        Self::IDS
            .iter()
            .find(|(id, _)| *id == prefix)
            .map(|(_, player)| *player)
    }

    pub fn as_str(&self) -> &'static str {
        Self::IDS[*self as usize].0
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `p1a: Pikachu`. The position letter is absent for benched members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PokemonIdent {
    pub side: Player,
    pub position: Option<char>,
    pub name: String,
}

impl PokemonIdent {
    pub fn parse(s: &str) -> Option<Self> {
        let (slot, name) = s.split_once(": ")?;
        Some(Self::new(
            Player::parse(slot)?,
            slot[2..].chars().next().filter(char::is_ascii_lowercase),
            name,
        ))
    }

    pub fn new(side: Player, position: Option<char>, name: impl Into<String>) -> Self {
        Self {
            side,
            position,
            name: name.into(),
        }
    }
}

/// Comma separated details: `Pikachu, L50, F, shiny, tera:Electric`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PokemonDetails {
    pub species: String,
    pub level: Option<u8>,
    pub gender: Option<char>,
    pub shiny: bool,
    pub tera_type: Option<String>,
}

impl PokemonDetails {
    pub fn parse(s: &str) -> Self {
        let mut fields = s.split(',').map(str::trim);
        let mut details = PokemonDetails {
            species: fields.next().unwrap_or_default().to_string(),
            ..Default::default()
        };

        for field in fields {
            match field {
                "M" | "F" => details.gender = field.chars().next(),
                "shiny" => details.shiny = true,
                _ => {
                    if let Some(level) = field.strip_prefix('L') {
                        details.level = level.parse().ok();
                    } else if let Some(tera) = field.strip_prefix("tera:") {
                        details.tera_type = Some(tera.to_string());
                    }
                }
            }
        }
        details
    }

    /// Omitted levels mean 100
    pub fn level_or_default(&self) -> u8 {
        self.level.unwrap_or(100)
    }
}

/// `CUR/MAX [STATUS]`. Opponents are usually reported out of 100, and a
/// fainted member is just `0 fnt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HpStatus {
    pub current: u32,
    pub max: Option<u32>,
    pub status: Option<String>,
}

impl HpStatus {
    pub fn parse(s: &str) -> Option<Self> {
        let mut words = s.split_whitespace();
        let hp = words.next()?;
        let (current, max) = match hp.split_once('/') {
            Some((current, max)) => (current.parse().ok()?, Some(max.parse().ok()?)),
            None => (hp.parse().ok()?, None),
        };

        Some(HpStatus {
            current,
            max,
            status: words.next().map(str::to_string),
        })
    }

    pub fn is_fainted(&self) -> bool {
        self.current == 0 || self.status.as_deref() == Some("fnt")
    }

    /// The status code unless it is the faint marker
    pub fn ailment(&self) -> Option<&str> {
        self.status.as_deref().filter(|code| *code != "fnt")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameType {
    Singles,
    Doubles,
    Triples,
    Multi,
    FreeForAll,
}

impl GameType {
    pub fn parse(s: &str) -> Option<Self> {
        let game_type = match s {
            "singles" => GameType::Singles,
            "doubles" => GameType::Doubles,
            "triples" => GameType::Triples,
            "multi" => GameType::Multi,
            "freeforall" => GameType::FreeForAll,
            _ => return None,
        };
        Some(game_type)
    }
}

/// A boostable stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    Atk,
    Def,
    Spa,
    Spd,
    Spe,
    Accuracy,
    Evasion,
}

impl Stat {
    pub const ALL: [Stat; 7] = [
        Stat::Atk,
        Stat::Def,
        Stat::Spa,
        Stat::Spd,
        Stat::Spe,
        Stat::Accuracy,
        Stat::Evasion,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        let stat = match to_id(s).as_str() {
            "atk" | "attack" => Stat::Atk,
            "def" | "defense" => Stat::Def,
            "spa" | "spatk" => Stat::Spa,
            "spd" | "spdef" => Stat::Spd,
            "spe" | "speed" => Stat::Spe,
            "accuracy" => Stat::Accuracy,
            "evasion" => Stat::Evasion,
            _ => return None,
        };
        Some(stat)
    }
}

/// Showdown's `toID`: lowercase, alphanumerics only.
///
/// "Will-O-Wisp" and "willowisp" both become `willowisp`.
pub fn to_id(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Positional argument at `index`, skipping empty fields and `[tag]` annotations
pub fn positional<'a>(parts: &[&'a str], index: usize) -> Option<&'a str> {
    parts
        .get(index)
        .copied()
        .filter(|s| !s.is_empty() && !s.starts_with('['))
}

/// Value of a `[name] VALUE` annotation anywhere in the message
pub fn annotation<'a>(parts: &[&'a str], name: &str) -> Option<&'a str> {
    let prefix = format!("[{}]", name);
    parts.iter().skip(2).find_map(|p| {
        p.strip_prefix(prefix.as_str())
            .map(str::trim_start)
            .filter(|v| !v.is_empty())
    })
}

/// Whether a bare `[name]` flag (or `[name] ...` annotation) is present
pub fn has_flag(parts: &[&str], name: &str) -> bool {
    let prefix = format!("[{}]", name);
    parts.iter().skip(2).any(|p| p.starts_with(prefix.as_str()))
}

fn missing(field: &str) -> anyhow::Error {
    ParseError::MissingField(field.to_string()).into()
}

pub fn parse_pokemon(parts: &[&str], index: usize) -> anyhow::Result<PokemonIdent> {
    parts
        .get(index)
        .and_then(|s| PokemonIdent::parse(s))
        .ok_or_else(|| missing("pokemon"))
}

pub fn parse_side(parts: &[&str], index: usize) -> anyhow::Result<Player> {
    parts
        .get(index)
        .and_then(|s| Player::parse(s))
        .ok_or_else(|| missing("side"))
}

/// A non-empty argument, or a `MissingField` error naming `field`
pub fn required(parts: &[&str], index: usize, field: &str) -> anyhow::Result<String> {
    match parts.get(index) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(missing(field)),
    }
}

pub fn parse_details(parts: &[&str], index: usize) -> PokemonDetails {
    parts
        .get(index)
        .map_or_else(PokemonDetails::default, |s| PokemonDetails::parse(s))
}

pub fn parse_hp_status(parts: &[&str], index: usize) -> Option<HpStatus> {
    positional(parts, index).and_then(HpStatus::parse)
}
