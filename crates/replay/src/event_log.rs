//! Recorded input events and the append-only capture log.

/// A single captured input event.
///
/// `order` is assigned at capture time, strictly increasing across the whole
/// session, and is the tie-break for events that share a tick. `value_count`
/// says how many of `value_1`/`value_2` are meaningful arguments on replay.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub name: String,
    pub value_1: f64,
    pub value_2: f64,
    pub value_count: u8,
    pub order: u64,
    pub tick: u64,
}

impl RecordedEvent {
    /// The positional arguments actually passed to a handler on replay:
    /// the first `value_count` of `(value_1, value_2)`.
    pub fn args(&self) -> Vec<f64> {
        match self.value_count {
            0 => Vec::new(),
            1 => vec![self.value_1],
            _ => vec![self.value_1, self.value_2],
        }
    }
}

/// Append-only, ordered log of events captured during a recording session.
///
/// Assigns each event its capture `order`, starting at 1.
#[derive(Debug)]
pub struct InputEventLog {
    events: Vec<RecordedEvent>,
    next_order: u64,
}

impl Default for InputEventLog {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            next_order: 1,
        }
    }
}

impl InputEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, stamping it with the next capture order.
    pub fn push(&mut self, name: &str, value_1: f64, value_2: f64, value_count: u8, tick: u64) {
        self.events.push(RecordedEvent {
            name: name.to_string(),
            value_1,
            value_2,
            value_count: value_count.min(2),
            order: self.next_order,
            tick,
        });
        self.next_order += 1;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }
}
