use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Semaphore;
use volley_battle::BattleState;
use volley_protocol::{BattleAction, to_id};

use crate::config::SessionLimits;
use crate::session::{BattleSession, SessionError};
use crate::transport::{Inbox, Transport};

/// Chooses one action for the current state.
///
/// Runs on the blocking pool, so it may take its time or call out to
/// something slow. An error ends the session it was deciding for.
pub trait DecisionMaker: Send + Sync + 'static {
    fn choose(&self, state: &BattleState) -> anyhow::Result<BattleAction>;
}

#[derive(Debug, Error)]
enum DecisionError {
    #[error("Worker pool closed")]
    PoolClosed,
    #[error("Decision timed out after {:.1}s", .0.as_secs_f64())]
    TimedOut(Duration),
    #[error("Decision task panicked: {0}")]
    Panicked(#[from] tokio::task::JoinError),
    #[error("Decision failed: {0:#}")]
    Failed(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleStatus {
    Initializing,
    TeamPreview,
    InProgress,
    Completed,
    Error,
}

impl BattleStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BattleStatus::Completed | BattleStatus::Error)
    }
}

/// Summary of a finished session
#[derive(Debug, Clone, PartialEq)]
pub struct BattleResult {
    pub battle_id: String,
    pub counterparty: String,
    pub winner: Option<String>,
    /// Whether the winner was us
    pub won: bool,
    pub turn_count: u32,
    pub duration: Duration,
    pub status: BattleStatus,
    /// Cause of an `Error` status
    pub error: Option<String>,
}

/// Lifecycle of one coordinated battle
pub struct SessionTracker<T> {
    session: BattleSession<Inbox, T>,
    counterparty: String,
    username: String,
    limits: SessionLimits,
    status: BattleStatus,
    turn_count: u32,
    started: Instant,
    error: Option<String>,
}

impl<T: Transport> SessionTracker<T> {
    pub fn new(
        session: BattleSession<Inbox, T>,
        counterparty: impl Into<String>,
        username: impl Into<String>,
        limits: SessionLimits,
    ) -> Self {
        Self {
            session,
            counterparty: counterparty.into(),
            username: username.into(),
            limits,
            status: BattleStatus::Initializing,
            turn_count: 0,
            started: Instant::now(),
            error: None,
        }
    }

    pub fn battle_id(&self) -> &str {
        self.session.room_id()
    }

    pub fn counterparty(&self) -> &str {
        &self.counterparty
    }

    pub fn status(&self) -> BattleStatus {
        self.status
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> Option<&BattleState> {
        self.session.state()
    }

    /// Sync with the first batch of the battle
    ///
    /// Waiting is bounded by what is left of the wall-clock budget.
    pub async fn initialize(&mut self) {
        tracing::info!(battle = %self.battle_id(), "Initializing battle");
        let budget = self.remaining_time();
        match tokio::time::timeout(budget, self.session.reset()).await {
            Ok(outcome) => self.absorb(outcome),
            Err(_) => self.time_out(),
        }
    }

    /// Initialize if that has not happened yet, otherwise make one decision
    pub async fn advance(
        &mut self,
        maker: &Arc<dyn DecisionMaker>,
        workers: &Arc<Semaphore>,
        decision_timeout: Duration,
    ) {
        match self.status {
            BattleStatus::Initializing => self.initialize().await,
            _ => self.make_decision(maker, workers, decision_timeout).await,
        }
    }

    /// Decide, send the action and wait for the resulting state.
    ///
    /// `decision_timeout` bounds the decision itself, not the wait for a
    /// worker or for the next batch. After a wait request there is nothing
    /// to decide, so this only waits. Failures end this session and are
    /// never returned.
    pub async fn make_decision(
        &mut self,
        maker: &Arc<dyn DecisionMaker>,
        workers: &Arc<Semaphore>,
        decision_timeout: Duration,
    ) {
        if self.is_complete() {
            tracing::debug!(battle = %self.battle_id(), "Decision requested for finished battle");
            return;
        }

        let Some(state) = self.session.state().cloned() else {
            self.fail("Battle not initialized");
            return;
        };

        let outcome = if state.legal.waiting {
            tracing::debug!(battle = %self.battle_id(), "Waiting for opponent");
            let budget = self.remaining_time();
            tokio::time::timeout(budget, self.session.wait_for_next_state()).await
        } else {
            let action = match decide(maker, workers, decision_timeout, state).await {
                Ok(action) => action,
                Err(e) => {
                    self.fail(e.to_string());
                    return;
                }
            };
            tracing::info!(battle = %self.battle_id(), choice = %action.to_choice(), "Action selected");
            let budget = self.remaining_time();
            tokio::time::timeout(budget, self.session.step(&action)).await
        };

        match outcome {
            Ok(outcome) => self.absorb(outcome),
            Err(_) => self.time_out(),
        }
    }

    /// Whether the battle is over, failed, or past its turn or time budget.
    /// Running over a budget marks the session `Error`.
    pub fn is_complete(&mut self) -> bool {
        if self.status.is_terminal() {
            return true;
        }
        if self.session.is_over() {
            self.status = BattleStatus::Completed;
            return true;
        }

        if self.turn_count >= self.limits.max_turns {
            tracing::warn!(
                battle = %self.battle_id(),
                max_turns = self.limits.max_turns,
                "Battle exceeded max turns"
            );
            self.mark_error(format!("Exceeded max turns: {}", self.turn_count));
            return true;
        }

        if self.started.elapsed() >= self.limits.max_duration {
            self.time_out();
            return true;
        }

        false
    }

    fn remaining_time(&self) -> Duration {
        self.limits
            .max_duration
            .saturating_sub(self.started.elapsed())
    }

    fn time_out(&mut self) {
        let elapsed = self.started.elapsed();
        tracing::warn!(battle = %self.battle_id(), elapsed = ?elapsed, "Battle exceeded max time");
        self.mark_error(format!("Exceeded max time: {:.1}s", elapsed.as_secs_f64()));
    }

    /// End the session with `cause`
    pub fn fail(&mut self, cause: impl Into<String>) {
        let cause = cause.into();
        tracing::error!(battle = %self.battle_id(), turn = self.turn_count, error = %cause, "Battle failed");
        self.mark_error(cause);
    }

    pub(crate) fn mark_error(&mut self, cause: impl Into<String>) {
        self.status = BattleStatus::Error;
        self.error = Some(cause.into());
    }

    pub fn result(&self) -> BattleResult {
        let winner = self.session.state().and_then(|s| s.winner.clone());
        let won = winner
            .as_deref()
            .is_some_and(|w| to_id(w) == to_id(&self.username));

        BattleResult {
            battle_id: self.battle_id().to_string(),
            counterparty: self.counterparty.clone(),
            winner,
            won,
            turn_count: self.turn_count,
            duration: self.started.elapsed(),
            status: self.status,
            error: self.error.clone(),
        }
    }

    fn absorb(&mut self, outcome: Result<BattleState, SessionError>) {
        match outcome {
            Ok(state) => {
                self.turn_count = state.turn();
                if self.session.is_over() {
                    self.finish(&state);
                } else if state.legal.team_preview {
                    self.status = BattleStatus::TeamPreview;
                } else {
                    self.status = BattleStatus::InProgress;
                }
            }
            Err(SessionError::StreamEnded) => {
                tracing::info!(battle = %self.battle_id(), "Battle stream ended");
                self.status = BattleStatus::Completed;
            }
            Err(SessionError::Transport(e)) => {
                tracing::warn!(battle = %self.battle_id(), error = %e, "Transport failed, ending battle");
                self.status = BattleStatus::Completed;
            }
            Err(e) => self.fail(e.to_string()),
        }
    }

    fn finish(&mut self, state: &BattleState) {
        self.status = BattleStatus::Completed;
        let battle = self.battle_id();

        match state.winner.as_deref() {
            Some(winner) if to_id(winner) == to_id(&self.username) => {
                tracing::info!(battle, turns = self.turn_count, "Victory");
            }
            Some(winner) => tracing::info!(battle, winner, turns = self.turn_count, "Defeat"),
            None => tracing::info!(battle, turns = self.turn_count, "Tie"),
        }
    }
}

/// Run one decision on the blocking pool.
///
/// The worker permit moves into the blocking task, so a decision that
/// outlives its timeout keeps its slot until it actually returns.
async fn decide(
    maker: &Arc<dyn DecisionMaker>,
    workers: &Arc<Semaphore>,
    limit: Duration,
    state: BattleState,
) -> Result<BattleAction, DecisionError> {
    let permit = Arc::clone(workers)
        .acquire_owned()
        .await
        .map_err(|_| DecisionError::PoolClosed)?;
    let maker = Arc::clone(maker);

    let task = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        maker.choose(&state)
    });

    let action = tokio::time::timeout(limit, task)
        .await
        .map_err(|_| DecisionError::TimedOut(limit))???;
    Ok(action)
}
