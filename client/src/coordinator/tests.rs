use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use volley_battle::BattleState;
use volley_protocol::BattleAction;

use super::*;
use crate::config::SessionLimits;
use crate::tracker::BattleStatus;
use crate::transport::{LocalTransport, RemoteEnd};

const REQUEST: &str = r#"{"active":[{"moves":[{"move":"Thunderbolt","id":"thunderbolt","pp":24,"maxpp":24,"target":"normal","disabled":false}]}],"side":{"name":"volley","id":"p1","pokemon":[{"ident":"p1: Pikachu","details":"Pikachu, L50, M","condition":"110/110","active":true,"moves":["thunderbolt"],"baseAbility":"static","item":"lightball"}]},"rqid":4}"#;

/// Picks the first legal move, else the first switch. Refuses to play Mallory.
struct FirstLegal;

impl DecisionMaker for FirstLegal {
    fn choose(&self, state: &BattleState) -> anyhow::Result<BattleAction> {
        if let Some(opponent) = state.opponent()
            && opponent.username == "Mallory"
        {
            anyhow::bail!("refusing to play Mallory");
        }

        if let Some(option) = state.legal.moves.first() {
            return Ok(BattleAction::move_slot(option.slot));
        }
        state
            .legal
            .switches
            .first()
            .map(|option| BattleAction::switch(option.slot))
            .ok_or_else(|| anyhow::anyhow!("no legal action"))
    }
}

/// Plays like `FirstLegal` after a delay, counting how many decisions overlap
struct Slow {
    delay: Duration,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl Slow {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl DecisionMaker for Slow {
    fn choose(&self, state: &BattleState) -> anyhow::Result<BattleAction> {
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.running.fetch_sub(1, Ordering::SeqCst);
        FirstLegal.choose(state)
    }
}

fn coordinator(config: CoordinatorConfig) -> (Coordinator<LocalTransport>, RemoteEnd) {
    coordinator_with(config, Arc::new(FirstLegal))
}

fn coordinator_with(
    config: CoordinatorConfig,
    maker: Arc<dyn DecisionMaker>,
) -> (Coordinator<LocalTransport>, RemoteEnd) {
    let (transport, remote) = LocalTransport::pair();
    let router = Arc::new(MessageRouter::new(Arc::new(transport)));
    let coordinator = Coordinator::new(router, maker, Reducer::default(), "Volley", config);
    (coordinator, remote)
}

fn capped(cap: usize) -> CoordinatorConfig {
    CoordinatorConfig {
        battles_per_counterparty: cap,
        ..CoordinatorConfig::default()
    }
}

fn opening(room: &str, opponent: &str) -> String {
    format!(
        ">{room}\n|player|p1|volley|1\n|player|p2|{opponent}|2\n|switch|p2a: Garchomp|Garchomp, L78, F|100/100\n|turn|1\n|request|{REQUEST}"
    )
}

fn knockout(room: &str) -> String {
    format!(
        ">{room}\n|move|p1a: Pikachu|Thunderbolt|p2a: Garchomp\n|-damage|p2a: Garchomp|0 fnt\n|faint|p2a: Garchomp\n|win|volley"
    )
}

#[tokio::test]
async fn test_counterparty_cap() {
    let (coordinator, _remote) = coordinator(capped(2));

    assert!(coordinator.can_start("X"));
    coordinator.start("battle-1", "X").unwrap();
    assert!(coordinator.can_start("X"));
    coordinator.start("battle-2", "X").unwrap();
    assert!(!coordinator.can_start("X"));

    assert_eq!(
        coordinator.start("battle-3", "X").err(),
        Some(CoordinatorError::AtCapacity {
            counterparty: "x".to_string(),
            cap: 2
        })
    );
    assert!(coordinator.can_start("Y"));
    assert_eq!(coordinator.active_count(Some("X")), 2);

    assert!(coordinator.complete("battle-1").await.is_some());
    assert!(coordinator.can_start("X"));
    coordinator.start("battle-3", "X").unwrap();
    assert_eq!(coordinator.active_count(None), 2);
    assert_eq!(coordinator.active_sessions(), vec!["battle-2", "battle-3"]);
}

#[tokio::test]
async fn test_start_registers_with_router() {
    let (coordinator, _remote) = coordinator(capped(4));

    coordinator.start("battle-1", "Rival").unwrap();
    assert!(coordinator.router().is_registered("battle-1"));
    assert_eq!(
        coordinator.start("battle-1", "Rival").err(),
        Some(CoordinatorError::AlreadyActive("battle-1".to_string()))
    );

    coordinator.complete("battle-1").await.unwrap();
    assert!(!coordinator.router().is_registered("battle-1"));
    assert!(coordinator.complete("battle-1").await.is_none());
    assert!(coordinator.tracker("battle-1").is_none());
}

#[tokio::test]
async fn test_battle_runs_to_victory() {
    let (coordinator, mut remote) = coordinator(capped(4));
    let router = Arc::clone(coordinator.router());

    coordinator.start("battle-1", "Rival").unwrap();
    router.route(opening("battle-1", "Rival"));

    coordinator.drive_all().await;
    let tracker = coordinator.tracker("battle-1").unwrap();
    assert_eq!(tracker.lock().await.status(), BattleStatus::InProgress);
    assert_eq!(tracker.lock().await.turn_count(), 1);

    router.route(knockout("battle-1"));
    coordinator.drive_all().await;

    assert_eq!(
        remote.from_client.recv().await.as_deref(),
        Some("battle-1|/choose move 1|4")
    );

    let results = coordinator.complete_finished().await;
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.battle_id, "battle-1");
    assert_eq!(result.counterparty, "rival");
    assert_eq!(result.winner.as_deref(), Some("volley"));
    assert!(result.won);
    assert_eq!(result.status, BattleStatus::Completed);
    assert_eq!(result.error, None);
    assert_eq!(coordinator.active_count(None), 0);
}

#[tokio::test]
async fn test_failed_decision_is_isolated() {
    let (coordinator, _remote) = coordinator(capped(4));
    let router = Arc::clone(coordinator.router());

    coordinator.start("battle-1", "Rival").unwrap();
    coordinator.start("battle-2", "Mallory").unwrap();
    router.route(opening("battle-1", "Rival"));
    router.route(opening("battle-2", "Mallory"));
    coordinator.drive_all().await;

    router.route(knockout("battle-1"));
    coordinator.drive_all().await;

    let failed = coordinator.tracker("battle-2").unwrap();
    {
        let failed = failed.lock().await;
        assert_eq!(failed.status(), BattleStatus::Error);
        assert!(failed.error().unwrap().contains("refusing to play Mallory"));
    }

    let won = coordinator.complete("battle-1").await.unwrap();
    assert_eq!(won.status, BattleStatus::Completed);
    assert!(won.won);
}

#[tokio::test]
async fn test_turn_budget_ends_session() {
    let config = CoordinatorConfig {
        limits: SessionLimits {
            max_turns: 1,
            ..SessionLimits::default()
        },
        ..CoordinatorConfig::default()
    };
    let (coordinator, _remote) = coordinator(config);

    coordinator.start("battle-1", "Rival").unwrap();
    coordinator.router().route(opening("battle-1", "Rival"));
    coordinator.drive_all().await;

    let results = coordinator.complete_finished().await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, BattleStatus::Error);
    assert!(results[0].error.as_deref().unwrap().contains("max turns"));
}

#[tokio::test]
async fn test_wall_clock_budget_ends_session() {
    let config = CoordinatorConfig {
        limits: SessionLimits {
            max_duration: Duration::ZERO,
            ..SessionLimits::default()
        },
        ..CoordinatorConfig::default()
    };
    let (coordinator, _remote) = coordinator(config);

    let tracker = coordinator.start("battle-1", "Rival").unwrap();
    assert!(tracker.lock().await.is_complete());

    let result = coordinator.complete("battle-1").await.unwrap();
    assert_eq!(result.status, BattleStatus::Error);
    assert!(result.error.unwrap().contains("max time"));
}

#[tokio::test]
async fn test_decision_timeout_marks_error() {
    let config = CoordinatorConfig {
        decision_timeout: Duration::from_millis(50),
        ..CoordinatorConfig::default()
    };
    let (coordinator, mut remote) = coordinator_with(config, Slow::new(Duration::from_millis(300)));
    let router = Arc::clone(coordinator.router());

    coordinator.start("battle-1", "Rival").unwrap();
    router.route(opening("battle-1", "Rival"));
    coordinator.drive_all().await;

    router.route(knockout("battle-1"));
    coordinator.drive_all().await;

    let tracker = coordinator.tracker("battle-1").unwrap();
    let tracker = tracker.lock().await;
    assert_eq!(tracker.status(), BattleStatus::Error);
    assert!(tracker.error().unwrap().contains("timed out"));
    assert!(remote.from_client.try_recv().is_err());
}

#[tokio::test]
async fn test_timed_out_decisions_keep_their_worker() {
    let config = CoordinatorConfig {
        max_workers: 1,
        decision_timeout: Duration::from_millis(20),
        ..capped(8)
    };
    let slow = Slow::new(Duration::from_millis(100));
    let (coordinator, _remote) = coordinator_with(config, slow.clone());
    let router = Arc::clone(coordinator.router());

    for round in 0..3 {
        let rooms: Vec<String> = (0..3).map(|i| format!("battle-{round}-{i}")).collect();
        for room in &rooms {
            coordinator.start(room, "Rival").unwrap();
            router.route(opening(room, "Rival"));
        }
        coordinator.drive_all().await;
        coordinator.drive_all().await;

        for room in &rooms {
            let tracker = coordinator.tracker(room).unwrap();
            let tracker = tracker.lock().await;
            assert_eq!(tracker.status(), BattleStatus::Error);
            assert!(tracker.error().unwrap().contains("timed out"));
        }
        assert_eq!(coordinator.complete_finished().await.len(), 3);
    }

    assert_eq!(slow.peak(), 1);
}

#[tokio::test]
async fn test_queued_decisions_do_not_time_out() {
    let config = CoordinatorConfig {
        max_workers: 1,
        decision_timeout: Duration::from_secs(1),
        ..capped(8)
    };
    let slow = Slow::new(Duration::from_millis(400));
    let (coordinator, mut remote) = coordinator_with(config, slow.clone());
    let router = Arc::clone(coordinator.router());
    let rooms = ["battle-1", "battle-2", "battle-3"];

    for room in rooms {
        coordinator.start(room, "Rival").unwrap();
        router.route(opening(room, "Rival"));
    }
    coordinator.drive_all().await;

    // The third decision waits 800ms for the worker, then runs within budget
    for room in rooms {
        router.route(knockout(room));
    }
    coordinator.drive_all().await;

    for room in rooms {
        let tracker = coordinator.tracker(room).unwrap();
        let tracker = tracker.lock().await;
        assert_eq!(tracker.status(), BattleStatus::Completed, "{room}");
        assert_eq!(tracker.error(), None);
    }
    for _ in rooms {
        assert!(remote.from_client.recv().await.is_some());
    }
    assert_eq!(slow.peak(), 1);
}

#[tokio::test]
async fn test_silent_server_hits_wall_clock_budget() {
    let config = CoordinatorConfig {
        limits: SessionLimits {
            max_duration: Duration::from_millis(200),
            ..SessionLimits::default()
        },
        ..CoordinatorConfig::default()
    };
    let (coordinator, mut remote) = coordinator(config);

    coordinator.start("battle-1", "Rival").unwrap();
    coordinator.router().route(opening("battle-1", "Rival"));
    coordinator.drive_all().await;

    // The choice goes out but no further battle traffic arrives
    coordinator.drive_all().await;
    assert!(remote.from_client.recv().await.is_some());

    let result = coordinator.complete("battle-1").await.unwrap();
    assert_eq!(result.status, BattleStatus::Error);
    assert!(result.error.unwrap().contains("max time"));
}

#[tokio::test]
async fn test_complete_in_progress_session_is_terminal() {
    let (coordinator, _remote) = coordinator(capped(4));

    coordinator.start("battle-1", "Rival").unwrap();
    coordinator.router().route(opening("battle-1", "Rival"));
    coordinator.drive_all().await;
    let tracker = coordinator.tracker("battle-1").unwrap();
    assert_eq!(tracker.lock().await.status(), BattleStatus::InProgress);

    let result = coordinator.complete("battle-1").await.unwrap();
    assert!(result.status.is_terminal());
    assert_eq!(result.status, BattleStatus::Error);
    assert_eq!(result.error.as_deref(), Some("completed while in progress"));
    assert_eq!(result.winner, None);
}

#[tokio::test]
async fn test_shutdown_ends_everything() {
    let (coordinator, _remote) = coordinator(capped(4));
    coordinator.start("battle-1", "Rival").unwrap();
    coordinator.start("battle-2", "Other").unwrap();

    let results = coordinator.shutdown().await;
    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.status, BattleStatus::Error);
        assert_eq!(result.error.as_deref(), Some("shutdown"));
    }
    assert_eq!(coordinator.active_count(None), 0);
    assert!(!coordinator.router().is_registered("battle-1"));

    // A stopped router returns straight away
    coordinator.router().run().await;
}
