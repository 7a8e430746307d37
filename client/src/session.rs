use std::sync::Arc;

use thiserror::Error;
use volley_battle::{BattleState, ReduceError, Reducer};
use volley_protocol::{BattleAction, ClientMessage};

use crate::stream::BattleStream;
use crate::transport::{MessageSource, Transport};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("battle stream ended")]
    StreamEnded,

    #[error("failed to apply battle event: {0}")]
    Reduce(#[from] ReduceError),

    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),

    #[error("session has not been reset")]
    NotStarted,
}

/// One battle's lifecycle: initial sync, act-and-advance, terminal detection.
///
/// Events arrive through the session's [`BattleStream`]; actions leave
/// through the shared transport. The state only ever moves forward a whole
/// batch at a time.
pub struct BattleSession<S, T> {
    room_id: String,
    stream: BattleStream<S>,
    transport: Arc<T>,
    reducer: Reducer,
    state: Option<BattleState>,
    history: Option<Vec<BattleState>>,
}

impl<S: MessageSource, T: Transport> BattleSession<S, T> {
    pub fn new(
        room_id: impl Into<String>,
        stream: BattleStream<S>,
        transport: Arc<T>,
        reducer: Reducer,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            stream,
            transport,
            reducer,
            state: None,
            history: None,
        }
    }

    /// Keep every state the session reduces to
    pub fn with_history(mut self) -> Self {
        self.history = Some(Vec::new());
        self
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn state(&self) -> Option<&BattleState> {
        self.state.as_ref()
    }

    /// States recorded so far, oldest first. Empty unless built `with_history`.
    pub fn history(&self) -> &[BattleState] {
        self.history.as_deref().unwrap_or_default()
    }

    pub fn stream(&self) -> &BattleStream<S> {
        &self.stream
    }

    /// Consume the first batch and reduce it onto a fresh state
    pub async fn reset(&mut self) -> Result<BattleState, SessionError> {
        let batch = self
            .stream
            .next_batch()
            .await
            .ok_or(SessionError::StreamEnded)?;
        let state = self.reducer.apply_all(&BattleState::default(), &batch)?;

        tracing::debug!(room = %self.room_id, events = batch.len(), "Session reset");
        Ok(self.commit(state))
    }

    /// Send `action` for the current request, then advance to the next batch
    pub async fn step(&mut self, action: &BattleAction) -> Result<BattleState, SessionError> {
        let state = self.state.as_ref().ok_or(SessionError::NotStarted)?;
        let message = ClientMessage::choose(&self.room_id, action, state.rqid);

        self.transport
            .send(message.to_wire_format())
            .await
            .map_err(SessionError::Transport)?;

        self.wait_for_next_state().await
    }

    /// Advance to the next batch without sending anything.
    ///
    /// The batch is reduced in order onto the current state, which is only
    /// replaced once every event in it has applied cleanly.
    pub async fn wait_for_next_state(&mut self) -> Result<BattleState, SessionError> {
        let current = self.state.clone().ok_or(SessionError::NotStarted)?;
        let batch = self
            .stream
            .next_batch()
            .await
            .ok_or(SessionError::StreamEnded)?;

        let next = self.reducer.apply_all(&current, &batch).inspect_err(|e| {
            tracing::error!(room = %self.room_id, error = %e, "Failed to reduce batch");
        })?;

        Ok(self.commit(next))
    }

    pub fn is_over(&self) -> bool {
        self.state.as_ref().is_some_and(BattleState::is_over)
    }

    fn commit(&mut self, state: BattleState) -> BattleState {
        if let Some(history) = self.history.as_mut() {
            history.push(state.clone());
        }
        self.state = Some(state.clone());
        state
    }
}
