//! Per-event logging for battle streams.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use volley_protocol::BattleEvent;

/// Receives every event a [`BattleStream`](crate::BattleStream) parses,
/// tagged with the turn it happened on.
pub trait EventLogger: Send {
    fn log(&mut self, turn_number: u32, event: &BattleEvent) -> Result<()>;
}

#[derive(Serialize)]
struct Record<'a> {
    turn_number: u32,
    event: &'a str,
}

/// Writes one JSON object per event: `{"turn_number": N, "event": "<raw line>"}`
pub struct JsonLinesLogger<W: Write> {
    writer: W,
}

impl JsonLinesLogger<BufWriter<File>> {
    /// Append to the file at `path`, creating it if needed
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::options()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open event log {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesLogger<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EventLogger for JsonLinesLogger<W> {
    fn log(&mut self, turn_number: u32, event: &BattleEvent) -> Result<()> {
        let record = Record {
            turn_number,
            event: &event.raw,
        };
        serde_json::to_writer(&mut self.writer, &record).context("Failed to encode event")?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volley_protocol::parse_event;

    #[test]
    fn test_json_lines_records() {
        let mut logger = JsonLinesLogger::new(Vec::new());
        logger.log(0, &parse_event("|player|p1|Alice|1")).unwrap();
        logger.log(3, &parse_event("|-damage|p2a: Garchomp|40/100")).unwrap();

        let output = String::from_utf8(logger.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(
            lines,
            vec![
                serde_json::json!({"turn_number": 0, "event": "|player|p1|Alice|1"}),
                serde_json::json!({"turn_number": 3, "event": "|-damage|p2a: Garchomp|40/100"}),
            ]
        );
    }
}
