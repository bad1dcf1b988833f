// src/schedule/sequence.rs

use std::collections::BTreeMap;
use std::collections::btree_map::IntoValues;
use std::iter::FusedIterator;

use tracing::info;

use crate::engine::StopFlag;
use crate::task::Task;

/// Single-pass stream of tasks in key order.
///
/// Every pull checks the stop flag first; once it is set, or the tasks run
/// out, the sequence stays ended.
#[derive(Debug)]
pub struct TaskSequence {
    tasks: IntoValues<u64, Task>,
    stop: StopFlag,
    done: bool,
}

impl TaskSequence {
    pub fn new(tasks: BTreeMap<u64, Task>, stop: StopFlag) -> Self {
        Self {
            tasks: tasks.into_values(),
            stop,
            done: false,
        }
    }

    /// Tasks left, ignoring the stop flag.
    pub fn remaining(&self) -> usize {
        if self.done { 0 } else { self.tasks.len() }
    }
}

impl Iterator for TaskSequence {
    type Item = Task;

    fn next(&mut self) -> Option<Task> {
        if self.done {
            return None;
        }
        if self.stop.is_requested() {
            info!(remaining = self.tasks.len(), "stop requested; no further jobs will start");
            self.done = true;
            return None;
        }
        let next = self.tasks.next();
        if next.is_none() {
            self.done = true;
        }
        next
    }
}

impl FusedIterator for TaskSequence {}
