//! Versioned line-oriented text codec for replay files.
//!
//! The format is deliberately human-readable: four fixed header lines
//! followed by one bracketed record per event in capture order.
//!
//! ```text
//! replay_version 2.0
//! stopped_at 6
//! seed 42
//! recorded_at 2026-08-29 12:00:00
//! [jump:,1,0,1,1,5]
//! ```
//!
//! Decoding is tolerant of blank lines and of event lines appearing in any
//! order on disk; [`ReplayFile::events_by_tick`] restores origination order.
//! Everything else is strict: an unsupported version tag or an
//! unparseable line rejects the file wholesale.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::event_log::RecordedEvent;

/// Format tag accepted by this build. Anything else is rejected outright.
pub const REPLAY_VERSION: &str = "2.0";

/// Decode failures. Both are fatal to the requested operation: a replay
/// file is applied wholesale or not at all.
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error(
        "replay file declares version {found:?} but this build only supports \
         {REPLAY_VERSION}; re-record the replay"
    )]
    IncompatibleVersion { found: String },
    #[error("replay data seems corrupt; cannot parse line {line:?}")]
    Corrupt { line: String },
}

/// In-memory form of a replay file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplayFile {
    /// Simulation tick at which the recording was stopped.
    pub stopped_at: u64,
    /// RNG seed the session was recorded under.
    pub seed: u64,
    /// Free-form timestamp of when the recording was made.
    pub recorded_at: String,
    /// Events in capture order.
    pub events: Vec<RecordedEvent>,
}

impl ReplayFile {
    /// Render the file as text: header lines in fixed order, then one
    /// bracketed record per event. The trailing `:` marks the name field.
    pub fn encode(&self) -> String {
        let mut text = String::new();
        text.push_str(&format!("replay_version {REPLAY_VERSION}\n"));
        text.push_str(&format!("stopped_at {}\n", self.stopped_at));
        text.push_str(&format!("seed {}\n", self.seed));
        text.push_str(&format!("recorded_at {}\n", self.recorded_at));
        for event in &self.events {
            text.push_str(&format!(
                "[{}:,{},{},{},{},{}]\n",
                event.name,
                event.value_1,
                event.value_2,
                event.value_count,
                event.order,
                event.tick
            ));
        }
        text
    }

    /// Parse replay text.
    ///
    /// The first line must be the exact supported version line. Header lines
    /// are matched by fixed prefixes; any line starting with `[` is an event
    /// record; blank lines are skipped; anything else is corrupt.
    pub fn decode(text: &str) -> Result<Self, CodecError> {
        let first = text.lines().next().unwrap_or("").trim();
        match first.strip_prefix("replay_version ") {
            Some(tag) if tag.trim() == REPLAY_VERSION => {}
            Some(tag) => {
                return Err(CodecError::IncompatibleVersion {
                    found: tag.trim().to_string(),
                })
            }
            None => {
                return Err(CodecError::IncompatibleVersion {
                    found: first.to_string(),
                })
            }
        }

        let mut file = ReplayFile::default();
        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with("replay_version") {
                continue;
            } else if let Some(rest) = line.strip_prefix("stopped_at ") {
                file.stopped_at = parse_field(rest, line)?;
            } else if let Some(rest) = line.strip_prefix("seed ") {
                file.seed = parse_field(rest, line)?;
            } else if let Some(rest) = line.strip_prefix("recorded_at ") {
                file.recorded_at = rest.trim().to_string();
            } else if line.starts_with('[') {
                file.events.push(parse_event_line(line)?);
            } else {
                return Err(CodecError::Corrupt {
                    line: line.to_string(),
                });
            }
        }
        Ok(file)
    }

    /// Group events by tick, each group sorted ascending by capture order.
    ///
    /// This restores origination order even when the file itself is not
    /// strictly tick-ordered.
    pub fn events_by_tick(&self) -> BTreeMap<u64, Vec<RecordedEvent>> {
        let mut by_tick: BTreeMap<u64, Vec<RecordedEvent>> = BTreeMap::new();
        for event in &self.events {
            by_tick.entry(event.tick).or_default().push(event.clone());
        }
        for group in by_tick.values_mut() {
            group.sort_by_key(|event| event.order);
        }
        by_tick
    }
}

/// Strictly parse one numeric field; no silent coercion to zero.
fn parse_field<T: std::str::FromStr>(field: &str, line: &str) -> Result<T, CodecError> {
    field.trim().parse().map_err(|_| CodecError::Corrupt {
        line: line.to_string(),
    })
}

fn parse_event_line(line: &str) -> Result<RecordedEvent, CodecError> {
    let inner = line.trim_start_matches('[').trim_end_matches(']');
    let fields: Vec<&str> = inner.split(',').map(str::trim).collect();
    let [name, value_1, value_2, value_count, order, tick] = fields[..] else {
        return Err(CodecError::Corrupt {
            line: line.to_string(),
        });
    };
    Ok(RecordedEvent {
        name: name.trim_end_matches(':').to_string(),
        value_1: parse_field(value_1, line)?,
        value_2: parse_field(value_2, line)?,
        value_count: parse_field(value_count, line)?,
        order: parse_field(order, line)?,
        tick: parse_field(tick, line)?,
    })
}
