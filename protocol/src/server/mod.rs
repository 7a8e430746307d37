mod battle;
mod battle_init;
mod battle_major;
mod battle_minor;
mod battle_progress;
mod global;
mod request;

use std::collections::HashMap;
use std::sync::LazyLock;

use anyhow::Result;

pub use battle::{
    GameType, HpStatus, Player, PokemonDetails, PokemonIdent, Stat, annotation, has_flag,
    positional, to_id,
};
pub use request::{ActivePokemon, BattleRequest, MoveSlot, SideInfo, SidePokemon};

/// One parsed protocol line
///
/// `raw` is the line exactly as received (minus surrounding whitespace) and is
/// kept for diagnostics and event logs.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleEvent {
    pub kind: EventKind,
    pub raw: String,
}

impl BattleEvent {
    pub fn new(kind: EventKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
        }
    }

    /// Whether the next legal action must be supplied after this event
    pub fn is_decision_point(&self) -> bool {
        matches!(
            self.kind,
            EventKind::Request { .. } | EventKind::Win { .. } | EventKind::Tie
        )
    }
}

/// Every battle protocol message this crate understands
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    // === Battle progress ===
    Turn {
        number: u32,
    },
    Start,
    Win {
        winner: String,
    },
    Tie,
    Upkeep,
    /// `|request|JSON`. The payload is kept verbatim; see [`BattleRequest::parse`].
    Request {
        json: String,
    },
    TeamPreview {
        count: Option<u32>,
    },

    // === Battle initialization ===
    Player {
        side: Player,
        username: String,
        avatar: Option<String>,
        rating: Option<u32>,
    },
    TeamSize {
        side: Player,
        size: u32,
    },
    Gen(u8),
    Tier(String),
    GameType(GameType),
    Poke {
        side: Player,
        details: PokemonDetails,
        has_item: bool,
    },
    ClearPoke,

    // === Major actions ===
    Switch {
        pokemon: PokemonIdent,
        details: PokemonDetails,
        hp: Option<HpStatus>,
    },
    Drag {
        pokemon: PokemonIdent,
        details: PokemonDetails,
        hp: Option<HpStatus>,
    },
    Move {
        pokemon: PokemonIdent,
        move_name: String,
        target: Option<PokemonIdent>,
        from: Option<String>,
        spread: bool,
        miss: bool,
        still: bool,
        anim: Option<String>,
    },
    Faint {
        pokemon: PokemonIdent,
    },
    Replace {
        pokemon: PokemonIdent,
        details: PokemonDetails,
        hp: Option<HpStatus>,
    },
    DetailsChange {
        pokemon: PokemonIdent,
        details: PokemonDetails,
        hp: Option<HpStatus>,
    },
    Cant {
        pokemon: PokemonIdent,
        reason: String,
        move_name: Option<String>,
    },

    // === HP and status ===
    Damage {
        pokemon: PokemonIdent,
        hp: Option<HpStatus>,
        from: Option<String>,
        of: Option<PokemonIdent>,
    },
    Heal {
        pokemon: PokemonIdent,
        hp: Option<HpStatus>,
        from: Option<String>,
        of: Option<PokemonIdent>,
    },
    SetHp {
        pokemon: PokemonIdent,
        hp: Option<HpStatus>,
    },
    Status {
        pokemon: PokemonIdent,
        status: String,
        from: Option<String>,
    },
    CureStatus {
        pokemon: PokemonIdent,
        status: String,
    },
    CureTeam {
        pokemon: PokemonIdent,
    },

    // === Stat stages ===
    Boost {
        pokemon: PokemonIdent,
        stat: Stat,
        amount: i8,
    },
    Unboost {
        pokemon: PokemonIdent,
        stat: Stat,
        amount: i8,
    },
    SetBoost {
        pokemon: PokemonIdent,
        stat: Stat,
        stage: i8,
    },
    ClearBoost {
        pokemon: PokemonIdent,
    },
    ClearAllBoost,
    ClearNegativeBoost {
        pokemon: PokemonIdent,
    },
    ClearPositiveBoost {
        pokemon: PokemonIdent,
    },
    InvertBoost {
        pokemon: PokemonIdent,
    },

    // === Revealed information ===
    Ability {
        pokemon: PokemonIdent,
        ability: String,
        from: Option<String>,
    },
    EndAbility {
        pokemon: PokemonIdent,
    },
    Item {
        pokemon: PokemonIdent,
        item: String,
        from: Option<String>,
    },
    EndItem {
        pokemon: PokemonIdent,
        item: String,
        from: Option<String>,
    },

    // === Volatile conditions ===
    StartVolatile {
        pokemon: PokemonIdent,
        effect: String,
        silent: bool,
    },
    EndVolatile {
        pokemon: PokemonIdent,
        effect: String,
        silent: bool,
    },
    SingleTurn {
        pokemon: PokemonIdent,
        effect: String,
    },
    SingleMove {
        pokemon: PokemonIdent,
        effect: String,
    },

    // === Field ===
    Weather {
        weather: String,
        upkeep: bool,
        from: Option<String>,
    },
    FieldStart {
        condition: String,
        from: Option<String>,
    },
    FieldEnd {
        condition: String,
    },
    SideStart {
        side: Player,
        condition: String,
    },
    SideEnd {
        side: Player,
        condition: String,
        from: Option<String>,
    },

    // === Transformations ===
    Terastallize {
        pokemon: PokemonIdent,
        tera_type: String,
    },
    FormeChange {
        pokemon: PokemonIdent,
        species: String,
        hp: Option<HpStatus>,
    },
    Transform {
        pokemon: PokemonIdent,
        target: PokemonIdent,
    },
    Mega {
        pokemon: PokemonIdent,
        megastone: Option<String>,
    },

    // === Informational ===
    Activate {
        pokemon: Option<PokemonIdent>,
        effect: String,
    },
    Prepare {
        pokemon: PokemonIdent,
        move_name: String,
        target: Option<PokemonIdent>,
    },
    SuperEffective {
        pokemon: PokemonIdent,
    },
    Resisted {
        pokemon: PokemonIdent,
    },
    Immune {
        pokemon: PokemonIdent,
    },
    Crit {
        pokemon: PokemonIdent,
    },
    Miss {
        source: PokemonIdent,
        target: Option<PokemonIdent>,
    },
    Fail {
        pokemon: PokemonIdent,
        action: Option<String>,
    },
    HitCount {
        pokemon: PokemonIdent,
        count: u32,
    },

    // === Out of band ===
    PrivateMessage {
        sender: String,
        recipient: String,
        message: String,
    },
    Popup {
        text: String,
    },
    Error {
        text: String,
    },

    /// Presentation-only lines (chat, joins, timestamps, ...)
    Ignored,
    /// A tag with no parser, or a known tag whose required fields were malformed
    Unknown {
        tag: String,
    },
}

type ParseFn = fn(&[&str]) -> Result<EventKind>;

fn parse_ignored(_parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Ignored)
}

/// Tag → parse routine.
static PARSERS: &[(&str, ParseFn)] = &[
    // progress
    ("turn", battle_progress::parse_turn),
    ("start", battle_progress::parse_start),
    ("win", battle_progress::parse_win),
    ("tie", battle_progress::parse_tie),
    ("upkeep", battle_progress::parse_upkeep),
    ("request", battle_progress::parse_request),
    ("teampreview", battle_progress::parse_teampreview),
    // init
    ("player", battle_init::parse_player),
    ("teamsize", battle_init::parse_teamsize),
    ("gen", battle_init::parse_gen),
    ("tier", battle_init::parse_tier),
    ("gametype", battle_init::parse_gametype),
    ("poke", battle_init::parse_poke),
    ("clearpoke", battle_init::parse_clearpoke),
    // major
    ("switch", battle_major::parse_switch),
    ("drag", battle_major::parse_drag),
    ("move", battle_major::parse_move),
    ("faint", battle_major::parse_faint),
    ("replace", battle_major::parse_replace),
    ("detailschange", battle_major::parse_detailschange),
    ("cant", battle_major::parse_cant),
    // minor
    ("-damage", battle_minor::parse_damage),
    ("-heal", battle_minor::parse_heal),
    ("-sethp", battle_minor::parse_sethp),
    ("-status", battle_minor::parse_status),
    ("-curestatus", battle_minor::parse_curestatus),
    ("-cureteam", battle_minor::parse_cureteam),
    ("-boost", battle_minor::parse_boost),
    ("-unboost", battle_minor::parse_unboost),
    ("-setboost", battle_minor::parse_setboost),
    ("-clearboost", battle_minor::parse_clearboost),
    ("-clearallboost", battle_minor::parse_clearallboost),
    ("-clearnegativeboost", battle_minor::parse_clearnegativeboost),
    ("-clearpositiveboost", battle_minor::parse_clearpositiveboost),
    ("-invertboost", battle_minor::parse_invertboost),
    ("-ability", battle_minor::parse_ability),
    ("-endability", battle_minor::parse_endability),
    ("-item", battle_minor::parse_item),
    ("-enditem", battle_minor::parse_enditem),
    ("-start", battle_minor::parse_start_volatile),
    ("-end", battle_minor::parse_end_volatile),
    ("-singleturn", battle_minor::parse_singleturn),
    ("-singlemove", battle_minor::parse_singlemove),
    ("-mustrecharge", battle_minor::parse_mustrecharge),
    ("-weather", battle_minor::parse_weather),
    ("-fieldstart", battle_minor::parse_fieldstart),
    ("-fieldend", battle_minor::parse_fieldend),
    ("-sidestart", battle_minor::parse_sidestart),
    ("-sideend", battle_minor::parse_sideend),
    ("-terastallize", battle_minor::parse_terastallize),
    ("-formechange", battle_minor::parse_formechange),
    ("-transform", battle_minor::parse_transform),
    ("-mega", battle_minor::parse_mega),
    ("-activate", battle_minor::parse_activate),
    ("-prepare", battle_minor::parse_prepare),
    ("-supereffective", battle_minor::parse_supereffective),
    ("-resisted", battle_minor::parse_resisted),
    ("-immune", battle_minor::parse_immune),
    ("-crit", battle_minor::parse_crit),
    ("-miss", battle_minor::parse_miss),
    ("-fail", battle_minor::parse_fail),
    ("-hitcount", battle_minor::parse_hitcount),
    // out of band
    ("pm", global::parse_pm),
    ("popup", global::parse_popup),
    ("error", global::parse_error),
    // presentation only
    ("", parse_ignored),
    ("j", parse_ignored),
    ("J", parse_ignored),
    ("l", parse_ignored),
    ("L", parse_ignored),
    ("n", parse_ignored),
    ("c", parse_ignored),
    ("c:", parse_ignored),
    ("chat", parse_ignored),
    ("raw", parse_ignored),
    ("html", parse_ignored),
    ("uhtml", parse_ignored),
    ("t:", parse_ignored),
    ("timestamp", parse_ignored),
    ("rule", parse_ignored),
    ("rated", parse_ignored),
    ("inactive", parse_ignored),
    ("inactiveoff", parse_ignored),
    ("title", parse_ignored),
    ("init", parse_ignored),
    ("debug", parse_ignored),
    ("seed", parse_ignored),
    ("split", parse_ignored),
    ("badge", parse_ignored),
    ("bigerror", parse_ignored),
    ("message", parse_ignored),
    ("-message", parse_ignored),
    ("-hint", parse_ignored),
    ("-center", parse_ignored),
    ("-nothing", parse_ignored),
    ("-notarget", parse_ignored),
    ("-combine", parse_ignored),
    ("-waiting", parse_ignored),
    ("-anim", parse_ignored),
];

static PARSER_TABLE: LazyLock<HashMap<&'static str, ParseFn>> =
    LazyLock::new(|| PARSERS.iter().copied().collect());

/// Parse a single protocol line into an event.
///
/// Never fails: unknown tags and known tags with malformed required fields
/// both come back as [`EventKind::Unknown`]. Lines that are not
/// pipe-delimited are plain room text and come back as [`EventKind::Ignored`].
pub fn parse_event(line: &str) -> BattleEvent {
    let line = line.trim();

    if !line.starts_with('|') {
        return BattleEvent::new(EventKind::Ignored, line);
    }

    let parts: Vec<&str> = line.split('|').collect();
    let tag = parts.get(1).copied().unwrap_or("");

    let kind = match PARSER_TABLE.get(tag) {
        Some(parse) => match parse(&parts) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!(tag, error = %e, line, "Malformed battle message");
                EventKind::Unknown {
                    tag: tag.to_string(),
                }
            }
        },
        None => {
            tracing::warn!(tag, line, "Unknown battle message type");
            EventKind::Unknown {
                tag: tag.to_string(),
            }
        }
    };

    BattleEvent::new(kind, line)
}

/// A transport message split into its routing marker and protocol lines
#[derive(Debug, Clone, PartialEq)]
pub struct ServerFrame {
    pub room_id: Option<String>,
    pub lines: Vec<String>,
}

/// Split a raw transport message.
///
/// A leading `>ROOMID` line designates the room; without one the frame is
/// lobby traffic. Blank lines are dropped.
pub fn parse_server_frame(frame: &str) -> ServerFrame {
    let mut lines = frame.lines().peekable();
    let mut room_id = None;

    if let Some(room) = lines.peek().and_then(|first| first.strip_prefix('>')) {
        room_id = Some(room.trim().to_string());
        lines.next();
    }

    let lines = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.to_string())
        .collect();

    ServerFrame { room_id, lines }
}
