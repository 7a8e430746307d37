//! Batched battle event streams.
//!
//! A [`BattleStream`] pulls raw transport messages from a [`MessageSource`],
//! splits and parses them line by line, and yields the parsed events in
//! batches. In live play a batch ends at a decision point (a request or the
//! end of the battle); replays have no requests, so there a batch ends at
//! each turn marker instead.

use std::collections::VecDeque;

use volley_protocol::{BattleEvent, EventKind, parse_event, parse_server_frame};

use crate::logger::EventLogger;
use crate::transport::MessageSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamMode {
    #[default]
    Live,
    Replay,
}

pub struct BattleStream<S> {
    source: S,
    mode: StreamMode,
    room: Option<String>,
    logger: Option<Box<dyn EventLogger>>,
    /// Lines read from the source but not yet parsed
    pending: VecDeque<String>,
    /// Events parsed into the batch under construction
    batch: Vec<BattleEvent>,
    current_turn: u32,
    ended: bool,
}

impl<S: MessageSource> BattleStream<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            mode: StreamMode::default(),
            room: None,
            logger: None,
            pending: VecDeque::new(),
            batch: Vec::new(),
            current_turn: 0,
            ended: false,
        }
    }

    pub fn with_mode(mut self, mode: StreamMode) -> Self {
        self.mode = mode;
        self
    }

    /// Skip messages routed to any room other than `room`
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    /// Mirror every parsed event to `logger`
    pub fn with_logger(mut self, logger: impl EventLogger + 'static) -> Self {
        self.logger = Some(Box::new(logger));
        self
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// Last turn number seen on the stream
    pub fn current_turn(&self) -> u32 {
        self.current_turn
    }

    /// Whether the source has been exhausted
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Wait for the next complete batch.
    ///
    /// The closing event is the last element. If the source ends mid-batch
    /// the partial batch is returned once; every call after that returns
    /// `None`. Dropping the returned future loses nothing: events already
    /// parsed stay buffered for the next call.
    pub async fn next_batch(&mut self) -> Option<Vec<BattleEvent>> {
        loop {
            while let Some(line) = self.pending.pop_front() {
                if line.trim().is_empty() || line.starts_with('>') {
                    continue;
                }

                let event = parse_event(&line);
                self.observe(&event);

                let closes = self.closes_batch(&event);
                self.batch.push(event);
                if closes {
                    return Some(std::mem::take(&mut self.batch));
                }
            }

            if self.ended {
                return None;
            }

            match self.source.next_message().await {
                Some(message) => self.enqueue(&message),
                None => {
                    self.ended = true;
                    if !self.batch.is_empty() {
                        return Some(std::mem::take(&mut self.batch));
                    }
                    return None;
                }
            }
        }
    }

    fn enqueue(&mut self, message: &str) {
        let frame = parse_server_frame(message);

        if let (Some(wanted), Some(room)) = (&self.room, &frame.room_id)
            && wanted != room
        {
            tracing::trace!(room = %room, "Skipping message for another room");
            return;
        }

        self.pending.extend(frame.lines);
    }

    fn observe(&mut self, event: &BattleEvent) {
        match &event.kind {
            EventKind::Turn { number } => self.current_turn = *number,
            EventKind::Error { text } => {
                tracing::error!(room = ?self.room, error = %text, "Server reported an error");
            }
            _ => {}
        }

        if let Some(logger) = self.logger.as_mut()
            && let Err(e) = logger.log(self.current_turn, event)
        {
            tracing::warn!(error = %e, "Failed to log battle event");
        }
    }

    fn closes_batch(&self, event: &BattleEvent) -> bool {
        match self.mode {
            StreamMode::Live => event.is_decision_point(),
            StreamMode::Replay => matches!(event.kind, EventKind::Turn { .. }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::sync::mpsc;

    use super::*;
    use crate::transport::{Inbox, LocalTransport};

    fn inbox(messages: &[&str]) -> Inbox {
        let (tx, rx) = mpsc::unbounded_channel();
        for message in messages {
            tx.send(message.to_string()).unwrap();
        }
        rx
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<(u32, String)>>>);

    impl EventLogger for Recorder {
        fn log(&mut self, turn_number: u32, event: &BattleEvent) -> anyhow::Result<()> {
            self.0.lock().unwrap().push((turn_number, event.raw.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_request_closes_batch() {
        let mut stream = BattleStream::new(inbox(&[
            ">battle-gen9ou-1\n|turn|1\n|switch|p1a: Pikachu|Pikachu, L50|100/100\n|request|{\"rqid\":1}",
        ]));

        let batch = stream.next_batch().await.unwrap();
        assert_eq!(batch.len(), 3);
        assert!(matches!(batch[0].kind, EventKind::Turn { number: 1 }));
        assert!(matches!(batch[2].kind, EventKind::Request { .. }));
        assert_eq!(stream.current_turn(), 1);

        assert!(stream.next_batch().await.is_none());
        assert!(stream.is_ended());
    }

    #[tokio::test]
    async fn test_batch_spans_messages_and_skips_preamble() {
        let mut stream = BattleStream::new(inbox(&[
            ">battle-1\n\n|player|p1|Alice|1",
            "|player|p2|Bob|2\n>battle-1\n|start",
            "|win|Alice",
        ]));

        let batch = stream.next_batch().await.unwrap();
        let raws: Vec<&str> = batch.iter().map(|e| e.raw.as_str()).collect();
        assert_eq!(
            raws,
            vec!["|player|p1|Alice|1", "|player|p2|Bob|2", "|start", "|win|Alice"]
        );
    }

    #[tokio::test]
    async fn test_lines_after_closing_event_are_kept() {
        let mut stream = BattleStream::new(inbox(&["|request|{\"rqid\":2}\n|move|p1a: Pikachu|Thunderbolt|p2a: Garchomp\n|turn|2"]));

        assert_eq!(stream.next_batch().await.unwrap().len(), 1);

        let rest = stream.next_batch().await.unwrap();
        assert_eq!(rest.len(), 2);
        assert_eq!(stream.current_turn(), 2);
        assert!(stream.next_batch().await.is_none());
    }

    #[tokio::test]
    async fn test_partial_batch_returned_once_on_disconnect() {
        let mut stream = BattleStream::new(inbox(&["|turn|5\n|-weather|RainDance"]));

        let partial = stream.next_batch().await.unwrap();
        assert_eq!(partial.len(), 2);
        assert!(stream.next_batch().await.is_none());
        assert!(stream.next_batch().await.is_none());
    }

    #[tokio::test]
    async fn test_replay_mode_closes_on_turns() {
        let mut stream = BattleStream::new(inbox(&[
            "|start\n|switch|p1a: Pikachu|Pikachu|100/100\n|turn|1\n|move|p1a: Pikachu|Tackle|p2a: Eevee\n|turn|2\n|win|Alice",
        ]))
        .with_mode(StreamMode::Replay);

        assert_eq!(stream.next_batch().await.unwrap().len(), 3);
        assert_eq!(stream.next_batch().await.unwrap().len(), 2);
        let last = stream.next_batch().await.unwrap();
        assert!(matches!(last[0].kind, EventKind::Win { .. }));
        assert!(stream.next_batch().await.is_none());
    }

    #[tokio::test]
    async fn test_room_filter_over_shared_transport() {
        let (transport, remote) = LocalTransport::pair();
        remote
            .to_client
            .send(">battle-other\n|turn|9\n|request|{}".to_string())
            .unwrap();
        remote
            .to_client
            .send(">battle-mine\n|turn|1\n|request|{}".to_string())
            .unwrap();
        drop(remote);

        let mut stream = BattleStream::new(Arc::new(transport)).with_room("battle-mine");
        let batch = stream.next_batch().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(stream.current_turn(), 1);
    }

    #[tokio::test]
    async fn test_logger_sees_every_event_with_turn() {
        let recorder = Recorder::default();
        let mut stream = BattleStream::new(inbox(&[
            "|player|p1|Alice|1\n|turn|1\n|error|[Invalid choice] Can't move\n|request|{}",
        ]))
        .with_logger(recorder.clone());

        stream.next_batch().await.unwrap();

        let logged = recorder.0.lock().unwrap().clone();
        assert_eq!(
            logged,
            vec![
                (0, "|player|p1|Alice|1".to_string()),
                (1, "|turn|1".to_string()),
                (1, "|error|[Invalid choice] Can't move".to_string()),
                (1, "|request|{}".to_string()),
            ]
        );
    }
}
