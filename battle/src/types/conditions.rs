//! Weather, terrain, side conditions and global field effects.
//!
//! Protocol names arrive in several spellings ("RainDance", "move: Trick
//! Room", "Stealth Rock"); all of them are matched on their [`to_id`] form.

use volley_protocol::to_id;

fn condition_id(s: &str) -> String {
    to_id(s.strip_prefix("move: ").unwrap_or(s))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weather {
    Sun,
    Rain,
    Sand,
    Hail,
    Snow,
    /// Desolate Land
    HarshSun,
    /// Primordial Sea
    HeavyRain,
    /// Delta Stream
    StrongWinds,
}

impl Weather {
    /// `None` for "none" and for anything unrecognised
    pub fn from_protocol(s: &str) -> Option<Self> {
        let weather = match condition_id(s).as_str() {
            "sunnyday" | "sun" => Weather::Sun,
            "raindance" | "rain" => Weather::Rain,
            "sandstorm" | "sand" => Weather::Sand,
            "hail" => Weather::Hail,
            "snow" | "snowscape" => Weather::Snow,
            "desolateland" | "harshsun" => Weather::HarshSun,
            "primordialsea" | "heavyrain" => Weather::HeavyRain,
            "deltastream" | "strongwinds" => Weather::StrongWinds,
            _ => return None,
        };
        Some(weather)
    }

    /// Weather from a primal ability. It lasts until its source leaves, so
    /// it has no turn counter.
    pub fn is_primal(&self) -> bool {
        matches!(
            self,
            Weather::HarshSun | Weather::HeavyRain | Weather::StrongWinds
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terrain {
    Electric,
    Grassy,
    Misty,
    Psychic,
}

impl Terrain {
    pub fn from_protocol(s: &str) -> Option<Self> {
        let terrain = match condition_id(s).as_str() {
            "electricterrain" => Terrain::Electric,
            "grassyterrain" => Terrain::Grassy,
            "mistyterrain" => Terrain::Misty,
            "psychicterrain" => Terrain::Psychic,
            _ => return None,
        };
        Some(terrain)
    }
}

/// Conditions set on one side of the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SideCondition {
    Reflect,
    LightScreen,
    AuroraVeil,
    Spikes,
    ToxicSpikes,
    StealthRock,
    StickyWeb,
    Tailwind,
    Safeguard,
    Mist,
    LuckyChant,
    WideGuard,
    QuickGuard,
    MatBlock,
}

impl SideCondition {
    pub fn from_protocol(s: &str) -> Option<Self> {
        let condition = match condition_id(s).as_str() {
            "reflect" => SideCondition::Reflect,
            "lightscreen" => SideCondition::LightScreen,
            "auroraveil" => SideCondition::AuroraVeil,
            "spikes" => SideCondition::Spikes,
            "toxicspikes" => SideCondition::ToxicSpikes,
            "stealthrock" => SideCondition::StealthRock,
            "stickyweb" => SideCondition::StickyWeb,
            "tailwind" => SideCondition::Tailwind,
            "safeguard" => SideCondition::Safeguard,
            "mist" => SideCondition::Mist,
            "luckychant" => SideCondition::LuckyChant,
            "wideguard" => SideCondition::WideGuard,
            "quickguard" => SideCondition::QuickGuard,
            "matblock" => SideCondition::MatBlock,
            _ => return None,
        };
        Some(condition)
    }

    pub fn is_hazard(&self) -> bool {
        matches!(
            self,
            SideCondition::Spikes
                | SideCondition::ToxicSpikes
                | SideCondition::StealthRock
                | SideCondition::StickyWeb
        )
    }

    /// Layer cap. Only Spikes and Toxic Spikes stack.
    pub fn max_layers(&self) -> u8 {
        match self {
            SideCondition::Spikes => 3,
            SideCondition::ToxicSpikes => 2,
            _ => 1,
        }
    }

    /// Turns a freshly set condition lasts, `None` for conditions that stay
    /// until removed
    pub fn duration(&self) -> Option<u8> {
        match self {
            SideCondition::Reflect
            | SideCondition::LightScreen
            | SideCondition::AuroraVeil
            | SideCondition::Safeguard
            | SideCondition::Mist
            | SideCondition::LuckyChant => Some(5),
            SideCondition::Tailwind => Some(4),
            SideCondition::WideGuard | SideCondition::QuickGuard | SideCondition::MatBlock => {
                Some(1)
            }
            _ => None,
        }
    }
}

/// Timed effects on the whole field rather than one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldEffect {
    TrickRoom,
    MagicRoom,
    WonderRoom,
    Gravity,
    MudSport,
    WaterSport,
    IonDeluge,
    FairyLock,
}

impl FieldEffect {
    pub fn from_protocol(s: &str) -> Option<Self> {
        let effect = match condition_id(s).as_str() {
            "trickroom" => FieldEffect::TrickRoom,
            "magicroom" => FieldEffect::MagicRoom,
            "wonderroom" => FieldEffect::WonderRoom,
            "gravity" => FieldEffect::Gravity,
            "mudsport" => FieldEffect::MudSport,
            "watersport" => FieldEffect::WaterSport,
            "iondeluge" => FieldEffect::IonDeluge,
            "fairylock" => FieldEffect::FairyLock,
            _ => return None,
        };
        Some(effect)
    }

    pub fn duration(&self) -> u8 {
        match self {
            FieldEffect::IonDeluge => 1,
            FieldEffect::FairyLock => 2,
            _ => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_spellings() {
        assert_eq!(Weather::from_protocol("RainDance"), Some(Weather::Rain));
        assert_eq!(Weather::from_protocol("Sandstorm"), Some(Weather::Sand));
        assert_eq!(Weather::from_protocol("Snowscape"), Some(Weather::Snow));
        assert_eq!(Weather::from_protocol("DesolateLand"), Some(Weather::HarshSun));
        assert_eq!(Weather::from_protocol("none"), None);
        assert_eq!(Weather::from_protocol("Fog"), None);
    }

    #[test]
    fn test_only_primal_weather_is_primal() {
        assert!(Weather::HeavyRain.is_primal());
        assert!(Weather::StrongWinds.is_primal());
        assert!(!Weather::Sun.is_primal());
        assert!(!Weather::Snow.is_primal());
    }

    #[test]
    fn test_terrain_with_move_prefix() {
        assert_eq!(Terrain::from_protocol("move: Grassy Terrain"), Some(Terrain::Grassy));
        assert_eq!(Terrain::from_protocol("Psychic Terrain"), Some(Terrain::Psychic));
        assert_eq!(Terrain::from_protocol("Psychic"), None);
    }

    #[test]
    fn test_side_conditions() {
        let rocks = SideCondition::from_protocol("move: Stealth Rock").unwrap();
        assert_eq!(rocks, SideCondition::StealthRock);
        assert!(rocks.is_hazard());
        assert_eq!(rocks.max_layers(), 1);
        assert_eq!(rocks.duration(), None);

        let tspikes = SideCondition::from_protocol("Toxic Spikes").unwrap();
        assert_eq!(tspikes.max_layers(), 2);

        let tailwind = SideCondition::from_protocol("Tailwind").unwrap();
        assert!(!tailwind.is_hazard());
        assert_eq!(tailwind.duration(), Some(4));
        assert_eq!(SideCondition::Reflect.duration(), Some(5));
        assert_eq!(SideCondition::from_protocol("Trick Room"), None);
    }

    #[test]
    fn test_field_effects() {
        assert_eq!(
            FieldEffect::from_protocol("move: Trick Room"),
            Some(FieldEffect::TrickRoom)
        );
        assert_eq!(FieldEffect::from_protocol("Electric Terrain"), None);
        assert_eq!(FieldEffect::Gravity.duration(), 5);
        assert_eq!(FieldEffect::FairyLock.duration(), 2);
    }
}
