// src/engine/status.rs

//! Presentation contract for the run loop.
//!
//! The run loop is the only caller, always from its foreground task, so
//! implementations never see concurrent calls.

use tracing::{debug, info};

use crate::task::DisplayImage;

/// Something that shows which job is running and how far along it is.
pub trait StatusSurface: Send {
    /// A new task is about to run. Progress is indeterminate until the first
    /// `progress` call.
    fn begin_task(&mut self, name: &str, image: Option<&DisplayImage>);

    /// The running task reported progress (`None` = indeterminate).
    fn progress(&mut self, action: &str, percent: Option<u8>);

    /// The running task is done; reset the display.
    fn clear(&mut self);
}

/// Status surface that reports through the log.
///
/// Repeated identical updates are collapsed so that chatty installers don't
/// flood the output.
#[derive(Debug, Default)]
pub struct ConsoleStatus {
    current: Option<String>,
    last: Option<(String, Option<u8>)>,
}

impl ConsoleStatus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusSurface for ConsoleStatus {
    fn begin_task(&mut self, name: &str, image: Option<&DisplayImage>) {
        info!(
            task = %name,
            image = ?image.map(|i| i.path.display().to_string()),
            "running"
        );
        self.current = Some(name.to_string());
        self.last = None;
    }

    fn progress(&mut self, action: &str, percent: Option<u8>) {
        let update = (action.to_string(), percent);
        if self.last.as_ref() == Some(&update) {
            return;
        }
        let task = self.current.as_deref().unwrap_or_default();
        let action_changed = self.last.as_ref().is_none_or(|(last, _)| last != action);
        if action_changed {
            info!(task = %task, percent = ?percent, "{}", action);
        } else {
            debug!(task = %task, percent = ?percent, "progress");
        }
        self.last = Some(update);
    }

    fn clear(&mut self) {
        self.current = None;
        self.last = None;
    }
}
