//! Outbound messages.
//!
//! Everything the client sends is a single text frame: the room the command
//! applies to, a `|`, then the command text. Lobby commands leave the room
//! empty.

use std::fmt;

mod action;

pub use action::BattleAction;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// Submit a decision, tagged with the request id it answers
    Choose { choice: String, rqid: Option<u64> },
    /// Log in with an assertion from the login server
    TrustedLogin { username: String, assertion: String },
    LeaveRoom(String),
    /// Queue for a ladder battle in a format
    Search(String),
    /// Sent exactly as given
    Raw(String),
}

impl fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Choose {
                choice,
                rqid: Some(rqid),
            } => write!(f, "/choose {choice}|{rqid}"),
            Self::Choose { choice, rqid: None } => write!(f, "/choose {choice}"),
            Self::TrustedLogin {
                username,
                assertion,
            } => write!(f, "/trn {username},0,{assertion}"),
            Self::LeaveRoom(room) => write!(f, "/leave {room}"),
            Self::Search(format) => write!(f, "/search {format}"),
            Self::Raw(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientMessage {
    pub room_id: Option<String>,
    pub command: ClientCommand,
}

impl ClientMessage {
    pub fn lobby(command: ClientCommand) -> Self {
        Self {
            room_id: None,
            command,
        }
    }

    /// Answer a battle request in `room_id`
    pub fn choose(room_id: &str, action: &BattleAction, rqid: Option<u64>) -> Self {
        Self {
            room_id: Some(room_id.to_string()),
            command: ClientCommand::Choose {
                choice: action.to_choice(),
                rqid,
            },
        }
    }

    pub fn to_wire_format(&self) -> String {
        format!("{}|{}", self.room_id.as_deref().unwrap_or(""), self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_wire_format() {
        let msg = ClientMessage::choose("battle-gen9ou-1", &BattleAction::switch(3), Some(12));
        assert_eq!(msg.to_wire_format(), "battle-gen9ou-1|/choose switch 3|12");

        let unnumbered = ClientMessage::choose("battle-gen9ou-1", &BattleAction::move_slot(2), None);
        assert_eq!(unnumbered.to_wire_format(), "battle-gen9ou-1|/choose move 2");
    }

    #[test]
    fn test_lobby_wire_format() {
        let search = ClientMessage::lobby(ClientCommand::Search("gen9randombattle".to_string()));
        assert_eq!(search.to_wire_format(), "|/search gen9randombattle");

        let login = ClientMessage::lobby(ClientCommand::TrustedLogin {
            username: "volleybot".to_string(),
            assertion: "abc;def".to_string(),
        });
        assert_eq!(login.to_wire_format(), "|/trn volleybot,0,abc;def");
    }
}
