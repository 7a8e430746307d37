//! Global field state

use std::collections::BTreeMap;

use super::conditions::{FieldEffect, Terrain, Weather};

/// Turns weather set by a move or ability lasts
pub const WEATHER_TURNS: u8 = 5;
/// Turns a terrain lasts
pub const TERRAIN_TURNS: u8 = 5;

/// Global field state affecting all Pokemon
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    /// Current weather condition
    pub weather: Option<Weather>,

    /// Remaining weather turns. Zero while weather is active means it has
    /// no fixed end (primal weather).
    pub weather_turns: u8,

    /// Current terrain
    pub terrain: Option<Terrain>,

    /// Remaining terrain turns
    pub terrain_turns: u8,

    /// Trick Room, Gravity and friends, with remaining turns
    pub effects: BTreeMap<FieldEffect, u8>,

    /// Current turn number (0 = not started)
    pub turn: u32,
}

impl FieldState {
    /// Create a new empty field state
    pub fn new() -> Self {
        Self::default()
    }

    /// Set weather from a `-weather` message. "none" or an unknown name clears it.
    pub fn set_weather(&mut self, name: &str) {
        match Weather::from_protocol(name) {
            Some(weather) => {
                self.weather = Some(weather);
                self.weather_turns = if weather.is_primal() { 0 } else { WEATHER_TURNS };
            }
            None => self.clear_weather(),
        }
    }

    /// Clear weather
    pub fn clear_weather(&mut self) {
        self.weather = None;
        self.weather_turns = 0;
    }

    /// Apply a field start condition from protocol
    pub fn start(&mut self, condition: &str) {
        if let Some(terrain) = Terrain::from_protocol(condition) {
            self.terrain = Some(terrain);
            self.terrain_turns = TERRAIN_TURNS;
        } else if let Some(effect) = FieldEffect::from_protocol(condition) {
            self.effects.insert(effect, effect.duration());
        } else if Weather::from_protocol(condition).is_some() {
            self.set_weather(condition);
        }
    }

    /// Apply a field end condition from protocol. Ending something that is
    /// not active is a no-op.
    pub fn end(&mut self, condition: &str) {
        if let Some(terrain) = Terrain::from_protocol(condition) {
            if self.terrain == Some(terrain) {
                self.terrain = None;
                self.terrain_turns = 0;
            }
        } else if let Some(effect) = FieldEffect::from_protocol(condition) {
            self.effects.remove(&effect);
        }
    }

    /// Whether a global effect is active
    pub fn has_effect(&self, effect: FieldEffect) -> bool {
        self.effects.contains_key(&effect)
    }

    /// End-of-turn tick: every active counter drops by one, floored at zero.
    /// Expiry itself is announced by the server with explicit end messages.
    pub fn upkeep(&mut self) {
        if self.weather.is_some() {
            self.weather_turns = self.weather_turns.saturating_sub(1);
        }
        if self.terrain.is_some() {
            self.terrain_turns = self.terrain_turns.saturating_sub(1);
        }
        for turns in self.effects.values_mut() {
            *turns = turns.saturating_sub(1);
        }
    }

    /// Advance the turn counter. Never goes backwards.
    pub fn set_turn(&mut self, turn: u32) {
        self.turn = self.turn.max(turn);
    }

    /// Check if any field condition is active
    pub fn has_any_condition(&self) -> bool {
        self.weather.is_some() || self.terrain.is_some() || !self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_field_is_empty() {
        let field = FieldState::new();
        assert!(field.weather.is_none());
        assert!(field.terrain.is_none());
        assert_eq!(field.turn, 0);
        assert!(!field.has_any_condition());
    }

    #[test]
    fn test_set_weather() {
        let mut field = FieldState::new();
        field.set_weather("RainDance");
        assert_eq!(field.weather, Some(Weather::Rain));
        assert_eq!(field.weather_turns, WEATHER_TURNS);

        field.set_weather("PrimordialSea");
        assert_eq!(field.weather, Some(Weather::HeavyRain));
        assert_eq!(field.weather_turns, 0);

        field.set_weather("none");
        assert!(field.weather.is_none());
    }

    #[test]
    fn test_start_terrain_and_rooms() {
        let mut field = FieldState::new();
        field.start("move: Grassy Terrain");
        assert_eq!(field.terrain, Some(Terrain::Grassy));
        assert_eq!(field.terrain_turns, TERRAIN_TURNS);

        field.start("move: Trick Room");
        assert!(field.has_effect(FieldEffect::TrickRoom));

        field.end("move: Trick Room");
        assert!(!field.has_effect(FieldEffect::TrickRoom));

        field.end("Electric Terrain");
        assert_eq!(field.terrain, Some(Terrain::Grassy));
        field.end("Grassy Terrain");
        assert!(field.terrain.is_none());
    }

    #[test]
    fn test_upkeep_decrements_active_counters_only() {
        let mut field = FieldState::new();
        field.set_weather("Sandstorm");
        field.start("Gravity");

        field.upkeep();
        assert_eq!(field.weather_turns, 4);
        assert_eq!(field.effects[&FieldEffect::Gravity], 4);
        assert_eq!(field.terrain_turns, 0);

        for _ in 0..10 {
            field.upkeep();
        }
        assert_eq!(field.weather_turns, 0);
        assert_eq!(field.effects[&FieldEffect::Gravity], 0);
        assert_eq!(field.weather, Some(Weather::Sand));
    }

    #[test]
    fn test_turn_is_monotonic() {
        let mut field = FieldState::new();
        field.set_turn(3);
        field.set_turn(2);
        assert_eq!(field.turn, 3);
    }
}
