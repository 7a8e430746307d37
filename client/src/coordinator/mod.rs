//! Many battles over one connection.
//!
//! The [`Coordinator`] owns the bookkeeping for every live session: which
//! battles exist, which counterparty each one is against, and the worker
//! pool their decisions run on. The maps live behind one mutex and are only
//! held for bookkeeping, never across an await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use volley_battle::Reducer;
use volley_protocol::to_id;

use crate::config::CoordinatorConfig;
use crate::lock;
use crate::router::MessageRouter;
use crate::session::BattleSession;
use crate::stream::BattleStream;
use crate::tracker::{BattleResult, DecisionMaker, SessionTracker};
use crate::transport::Transport;

pub type SharedTracker<T> = Arc<tokio::sync::Mutex<SessionTracker<T>>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error("already {cap} active battles against {counterparty}")]
    AtCapacity { counterparty: String, cap: usize },

    #[error("battle {0} is already active")]
    AlreadyActive(String),
}

struct Registry<T> {
    sessions: HashMap<String, SharedTracker<T>>,
    /// Normalized counterparty name -> battle ids
    by_counterparty: HashMap<String, Vec<String>>,
}

pub struct Coordinator<T> {
    router: Arc<MessageRouter<T>>,
    reducer: Reducer,
    maker: Arc<dyn DecisionMaker>,
    username: String,
    config: CoordinatorConfig,
    workers: Arc<Semaphore>,
    registry: Mutex<Registry<T>>,
}

impl<T: Transport> Coordinator<T> {
    pub fn new(
        router: Arc<MessageRouter<T>>,
        maker: Arc<dyn DecisionMaker>,
        reducer: Reducer,
        username: impl Into<String>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            router,
            reducer,
            maker,
            username: username.into(),
            workers: Arc::new(Semaphore::new(config.max_workers.max(1))),
            config,
            registry: Mutex::new(Registry {
                sessions: HashMap::new(),
                by_counterparty: HashMap::new(),
            }),
        }
    }

    pub fn router(&self) -> &Arc<MessageRouter<T>> {
        &self.router
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Whether another battle against `counterparty` fits under the cap
    pub fn can_start(&self, counterparty: &str) -> bool {
        self.active_count(Some(counterparty)) < self.config.battles_per_counterparty
    }

    /// Active battles against `counterparty`, or in total
    pub fn active_count(&self, counterparty: Option<&str>) -> usize {
        let registry = lock(&self.registry);
        match counterparty {
            Some(name) => registry
                .by_counterparty
                .get(&to_id(name))
                .map_or(0, Vec::len),
            None => registry.sessions.len(),
        }
    }

    /// Track a new battle and route its room's traffic to it.
    ///
    /// The session starts out `Initializing`; the next
    /// [`drive_all`](Self::drive_all) syncs it with its first batch.
    pub fn start(
        &self,
        battle_id: &str,
        counterparty: &str,
    ) -> Result<SharedTracker<T>, CoordinatorError> {
        let counterparty = to_id(counterparty);
        let cap = self.config.battles_per_counterparty;

        let mut registry = lock(&self.registry);
        if registry.sessions.contains_key(battle_id) {
            return Err(CoordinatorError::AlreadyActive(battle_id.to_string()));
        }
        if registry.by_counterparty.get(&counterparty).map_or(0, Vec::len) >= cap {
            return Err(CoordinatorError::AtCapacity { counterparty, cap });
        }

        let (tx, inbox) = mpsc::unbounded_channel();
        self.router.register(battle_id, tx);

        let session = BattleSession::new(
            battle_id,
            BattleStream::new(inbox),
            Arc::clone(self.router.transport()),
            self.reducer.clone(),
        );
        let tracker = Arc::new(tokio::sync::Mutex::new(SessionTracker::new(
            session,
            counterparty.as_str(),
            self.username.as_str(),
            self.config.limits.clone(),
        )));

        registry
            .sessions
            .insert(battle_id.to_string(), Arc::clone(&tracker));
        registry
            .by_counterparty
            .entry(counterparty.clone())
            .or_default()
            .push(battle_id.to_string());
        let total = registry.sessions.len();
        drop(registry);

        tracing::info!(battle = battle_id, counterparty = %counterparty, total, "Started battle");
        Ok(tracker)
    }

    pub fn tracker(&self, battle_id: &str) -> Option<SharedTracker<T>> {
        lock(&self.registry).sessions.get(battle_id).cloned()
    }

    /// Ids of every tracked battle, sorted
    pub fn active_sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.registry).sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Advance every unfinished session by one step.
    ///
    /// Steps run concurrently; decisions share the worker pool. Each
    /// decision gets the configured timeout once it holds a worker, and one
    /// that runs over ends its own session without touching the others.
    pub async fn drive_all(&self) {
        let trackers: Vec<SharedTracker<T>> = lock(&self.registry)
            .sessions
            .values()
            .map(Arc::clone)
            .collect();

        join_all(trackers.into_iter().map(|tracker| self.drive_one(tracker))).await;
    }

    async fn drive_one(&self, tracker: SharedTracker<T>) {
        let mut tracker = tracker.lock().await;
        if !tracker.is_complete() {
            tracker
                .advance(&self.maker, &self.workers, self.config.decision_timeout)
                .await;
        }
    }

    /// Stop tracking a battle and return its summary.
    ///
    /// A session that has not finished yet is marked `Error`.
    pub async fn complete(&self, battle_id: &str) -> Option<BattleResult> {
        let (tracker, remaining) = {
            let mut registry = lock(&self.registry);
            let tracker = registry.sessions.remove(battle_id)?;
            registry.by_counterparty.retain(|_, battles| {
                battles.retain(|id| id != battle_id);
                !battles.is_empty()
            });
            (tracker, registry.sessions.len())
        };

        self.router.unregister(battle_id);
        let result = {
            let mut tracker = tracker.lock().await;
            if !tracker.is_complete() {
                tracker.mark_error("completed while in progress");
            }
            tracker.result()
        };

        tracing::info!(
            battle = battle_id,
            winner = ?result.winner,
            turns = result.turn_count,
            duration = ?result.duration,
            status = ?result.status,
            remaining,
            "Completed battle"
        );

        Some(result)
    }

    /// Complete every battle that has finished
    pub async fn complete_finished(&self) -> Vec<BattleResult> {
        let mut finished = Vec::new();
        for battle_id in self.active_sessions() {
            if let Some(tracker) = self.tracker(&battle_id)
                && tracker.lock().await.is_complete()
            {
                finished.push(battle_id);
            }
        }

        let mut results = Vec::with_capacity(finished.len());
        for battle_id in finished {
            if let Some(result) = self.complete(&battle_id).await {
                results.push(result);
            }
        }
        results
    }

    /// End every session, close the worker pool and stop the router
    pub async fn shutdown(&self) -> Vec<BattleResult> {
        tracing::info!("Shutting down");

        let mut results = Vec::new();
        for battle_id in self.active_sessions() {
            if let Some(tracker) = self.tracker(&battle_id) {
                let mut tracker = tracker.lock().await;
                if !tracker.status().is_terminal() {
                    tracker.mark_error("shutdown");
                }
            }
            if let Some(result) = self.complete(&battle_id).await {
                results.push(result);
            }
        }

        self.workers.close();
        self.router.stop();
        tracing::info!("Shutdown complete");
        results
    }
}

#[cfg(test)]
mod tests;
