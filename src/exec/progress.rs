// src/exec/progress.rs

//! Decoder for the package installer's progress message stream.
//!
//! The installer sends two kinds of messages we care about:
//!
//! - *ActionData*: the display text of the item being processed. If the
//!   current action announced a per-item step (progress type 1), each
//!   ActionData message also advances the bar by that step.
//! - *Progress*: `1: <type> 2: <value> [3: <flag>]`, where type is
//!   - `0` reset: total = value, run in reverse iff flag, restart the bar
//!   - `1` per-item step: step = value if flag else 0
//!   - `2` increment the bar by value
//!   - `3` add value to the expected total
//!
//! Every state change that affects the percentage is reported to the
//! observer. Malformed payloads are rejected without touching the state.

use super::ProgressObserver;

/// Which way the bar moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    fn apply(self, ticks: i64) -> i64 {
        match self {
            Direction::Forward => ticks,
            Direction::Reverse => ticks.saturating_neg(),
        }
    }
}

/// Progress state for one package operation.
#[derive(Debug, Clone)]
pub struct ProgressDecoder {
    total_ticks: i64,
    current_ticks: i64,
    step_per_action_data: i64,
    direction: Direction,
    action: String,
}

impl Default for ProgressDecoder {
    fn default() -> Self {
        Self {
            total_ticks: 0,
            current_ticks: 0,
            step_per_action_data: 0,
            direction: Direction::Forward,
            action: String::new(),
        }
    }
}

impl ProgressDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Current percentage: `0` while the total is unknown, otherwise the
    /// rounded ratio clamped to `0..=100`.
    pub fn percent(&self) -> u8 {
        if self.total_ticks == 0 {
            return 0;
        }
        let ratio = self.current_ticks as f64 * 100.0 / self.total_ticks as f64;
        ratio.round_ties_even().clamp(0.0, 100.0) as u8
    }

    /// Handle an ActionData message. Always reports.
    pub fn action_data(&mut self, text: &str, observer: &dyn ProgressObserver) {
        self.action = text.to_string();
        if self.step_per_action_data != 0 {
            self.current_ticks = self
                .current_ticks
                .saturating_add(self.direction.apply(self.step_per_action_data));
        }
        self.report(observer);
    }

    /// Handle a Progress message. Returns `false` if the payload was rejected.
    pub fn progress(&mut self, payload: &str, observer: &dyn ProgressObserver) -> bool {
        let Some(message) = ProgressMessage::parse(payload) else {
            return false;
        };

        match (message.kind, message.flag) {
            (0, Some(reverse)) => {
                self.total_ticks = message.value;
                self.direction = if reverse {
                    Direction::Reverse
                } else {
                    Direction::Forward
                };
                self.current_ticks = match self.direction {
                    Direction::Forward => 0,
                    Direction::Reverse => self.total_ticks,
                };
                self.report(observer);
            }
            (1, Some(per_item)) => {
                self.step_per_action_data = if per_item { message.value } else { 0 };
            }
            (0 | 1, None) => return false,
            (2, _) => {
                if message.value != 0 {
                    self.current_ticks = self
                        .current_ticks
                        .saturating_add(self.direction.apply(message.value));
                    self.report(observer);
                }
            }
            (3, _) => {
                self.total_ticks = self.total_ticks.saturating_add(message.value);
                self.report(observer);
            }
            // Other message types carry nothing we display.
            _ => {}
        }
        true
    }

    fn report(&self, observer: &dyn ProgressObserver) {
        observer.report(&self.action, Some(self.percent()));
    }
}

/// A parsed `1: <type> 2: <value> [3: <flag>]` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ProgressMessage {
    kind: i32,
    value: i64,
    flag: Option<bool>,
}

impl ProgressMessage {
    fn parse(payload: &str) -> Option<Self> {
        let parts: Vec<&str> = payload.split(' ').filter(|p| !p.is_empty()).collect();
        if parts.len() != 4 && parts.len() != 6 {
            return None;
        }
        if parts[0] != "1:" || parts[2] != "2:" {
            return None;
        }
        let kind = parts[1].parse::<i32>().ok()?;
        let value = parts[3].parse::<i64>().ok()?;

        let flag = if parts.len() == 6 {
            if parts[4] != "3:" {
                return None;
            }
            match parts[5].parse::<i32>().ok()? {
                0 => Some(false),
                1 => Some(true),
                _ => return None,
            }
        } else {
            None
        };

        Some(Self { kind, value, flag })
    }
}
