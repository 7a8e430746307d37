//! Ladder bot that plays random legal actions.
//!
//! Searches for battles in one format and plays every battle it is matched
//! into through the coordinator. The connection must already be allowed to
//! search: pass a login assertion in `BOT_ASSERTION` if the server needs one.
//!
//! ```text
//! RUST_LOG=info BOT_NAME=volleybot cargo run --example ladder_bot
//! ```

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use tracing_subscriber::EnvFilter;
use volley_client::{
    BattleAction, BattleState, ClientCommand, ClientMessage, Coordinator, CoordinatorConfig,
    DecisionMaker, MessageRouter, Reducer, SHOWDOWN_URL, Transport, WsTransport,
};

struct RandomChoice;

impl DecisionMaker for RandomChoice {
    fn choose(&self, state: &BattleState) -> Result<BattleAction> {
        let legal = &state.legal;
        let mut rng = rand::thread_rng();

        if legal.team_preview {
            let size = state.me().map_or(6, |team| team.pokemon.len().max(1));
            return Ok(BattleAction::Team {
                order: (1..=size).collect(),
            });
        }

        let mut choices: Vec<BattleAction> = legal
            .moves
            .iter()
            .map(|option| BattleAction::move_slot(option.slot))
            .collect();
        if choices.is_empty() || legal.force_switch {
            choices = legal
                .switches
                .iter()
                .map(|option| BattleAction::switch(option.slot))
                .collect();
        }

        choices
            .choose(&mut rng)
            .cloned()
            .context("No legal action available")
    }
}

fn lobby_command(command: ClientCommand) -> String {
    ClientMessage::lobby(command).to_wire_format()
}

/// Battle rooms listed in an `|updatesearch|` payload
fn searched_games(line: &str) -> Vec<String> {
    let Some(json) = line.strip_prefix("|updatesearch|") else {
        return Vec::new();
    };
    serde_json::from_str::<serde_json::Value>(json)
        .ok()
        .and_then(|v| v.get("games")?.as_object().map(|games| games.keys().cloned().collect()))
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let url = env::var("SHOWDOWN_URL").unwrap_or_else(|_| SHOWDOWN_URL.to_string());
    let name = env::var("BOT_NAME").unwrap_or_else(|_| "volleybot".to_string());
    let format = env::var("BOT_FORMAT").unwrap_or_else(|_| "gen9randombattle".to_string());

    let transport = Arc::new(WsTransport::connect(&url).await?);
    let router = Arc::new(MessageRouter::new(Arc::clone(&transport)));
    let mut lobby = router.take_lobby().context("Lobby inbox already taken")?;

    tokio::spawn({
        let router = Arc::clone(&router);
        async move { router.run().await }
    });

    let coordinator = Arc::new(Coordinator::new(
        Arc::clone(&router),
        Arc::new(RandomChoice),
        Reducer::default(),
        name.as_str(),
        CoordinatorConfig::default(),
    ));

    if let Ok(assertion) = env::var("BOT_ASSERTION") {
        let login = ClientCommand::TrustedLogin {
            username: name.clone(),
            assertion,
        };
        transport.send(lobby_command(login)).await?;
    }
    transport
        .send(lobby_command(ClientCommand::Search(format.clone())))
        .await?;

    let driver = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        let transport = Arc::clone(&transport);
        let format = format.clone();
        async move {
            loop {
                if coordinator.active_count(None) == 0 {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    continue;
                }

                coordinator.drive_all().await;
                for result in coordinator.complete_finished().await {
                    println!(
                        "{}: {:?} after {} turns ({})",
                        result.battle_id,
                        result.status,
                        result.turn_count,
                        if result.won { "won" } else { "lost" }
                    );
                    let leave = lobby_command(ClientCommand::LeaveRoom(result.battle_id));
                    let search = lobby_command(ClientCommand::Search(format.clone()));
                    for command in [leave, search] {
                        if let Err(e) = transport.send(command).await {
                            tracing::error!(error = %e, "Failed to queue next battle");
                            return;
                        }
                    }
                }
            }
        }
    });

    loop {
        tokio::select! {
            message = lobby.recv() => {
                let Some(message) = message else { break };
                for line in message.lines() {
                    for battle_id in searched_games(line) {
                        if coordinator.tracker(&battle_id).is_some() {
                            continue;
                        }
                        if let Err(e) = coordinator.start(&battle_id, "ladder") {
                            tracing::warn!(battle = %battle_id, error = %e, "Not starting battle");
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    driver.abort();
    for result in coordinator.shutdown().await {
        println!("{}: {:?}", result.battle_id, result.status);
    }
    transport.close().await?;
    Ok(())
}
