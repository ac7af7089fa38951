//! File-based event archival via JSON Lines.
//!
//! Events are stored as one JSON object per line (`.jsonl` format).
//! This is simple, streamable, and human-readable.
//!
//! Engine events are an audit trail, not a replay log: engine inputs
//! include external oracle reads, so a saved event file documents what
//! the engine decided but cannot reconstruct its state. Load the file
//! for inspection, monitoring, or offline analysis.
//!
//! # Usage
//!
//! ```ignore
//! use trailstop::persistence;
//! use std::path::Path;
//!
//! // Archive the engine's audit trail
//! engine.save_events(Path::new("decisions.jsonl")).unwrap();
//!
//! // Read it back for analysis
//! let events = persistence::load_events(Path::new("decisions.jsonl")).unwrap();
//! ```

use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::engine::TrailingStopEngine;
use crate::events::EngineEvent;

/// Save events to a file in JSON Lines format.
///
/// Each event is serialized as one JSON object per line.
pub fn save_events(events: &[EngineEvent], path: &Path) -> io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);

    for event in events {
        let json =
            serde_json::to_string(event).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        writeln!(writer, "{}", json)?;
    }

    writer.flush()?;
    Ok(())
}

/// Load events from a JSON Lines file.
///
/// Each line is parsed as one JSON event object.
/// Empty lines are skipped.
pub fn load_events(path: &Path) -> io::Result<Vec<EngineEvent>> {
    let file = std::fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let mut events = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: EngineEvent = serde_json::from_str(line).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line {}: {}", line_num + 1, e),
            )
        })?;
        events.push(event);
    }

    Ok(events)
}

impl TrailingStopEngine {
    /// Save the engine's audit trail to a file.
    ///
    /// The file uses JSON Lines format (one event per line).
    /// Requires the `persistence` feature.
    pub fn save_events(&self, path: &Path) -> io::Result<()> {
        save_events(self.events(), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderType;
    use crate::types::{AccountId, FeedId, OrderId, Price};
    use std::path::PathBuf;

    fn test_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(format!("test_{}.jsonl", name))
    }

    fn sample_events() -> Vec<EngineEvent> {
        vec![
            EngineEvent::ConfigUpdated {
                order_id: OrderId(1),
                feed: FeedId(7),
                initial_stop_price: Price::from_units(1960),
                trailing_distance_bps: 200,
                order_type: OrderType::Sell,
                twap_window_secs: 600,
                max_deviation_bps: 500,
            },
            EngineEvent::StopPriceUpdated {
                order_id: OrderId(1),
                old_stop_price: Price::from_units(1960),
                new_stop_price: Price::from_units(2058),
                current_price: Price::from_units(2100),
                twap: Price::from_units(2100),
                caller: AccountId(30),
            },
            EngineEvent::Triggered {
                order_id: OrderId(1),
                counterparty: AccountId(40),
                settle_amount: 2000_000_000,
                stop_price: Price::from_units(2058),
                twap: Price::from_units(2050),
            },
        ]
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = test_path("round_trip");

        let events = sample_events();
        save_events(&events, &path).unwrap();
        let loaded = load_events(&path).unwrap();

        assert_eq!(events, loaded);

        // Cleanup
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_nonexistent_file() {
        let result = load_events(Path::new("nonexistent_file.jsonl"));
        assert!(result.is_err());
    }

    #[test]
    fn load_skips_blank_lines() {
        let path = test_path("blank_lines");

        let events = sample_events();
        save_events(&events, &path).unwrap();

        // Append a couple of blank lines by rewriting the file
        let mut contents = std::fs::read_to_string(&path).unwrap();
        contents.push_str("\n\n");
        std::fs::write(&path, contents).unwrap();

        let loaded = load_events(&path).unwrap();
        assert_eq!(loaded.len(), events.len());

        // Cleanup
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_rejects_garbage_line() {
        let path = test_path("garbage");

        std::fs::write(&path, "not json\n").unwrap();
        let err = load_events(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        // Cleanup
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn save_empty_log() {
        let path = test_path("empty");

        save_events(&[], &path).unwrap();
        let loaded = load_events(&path).unwrap();
        assert!(loaded.is_empty());

        // Cleanup
        let _ = std::fs::remove_file(&path);
    }
}
