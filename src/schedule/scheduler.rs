// src/schedule/scheduler.rs

use std::collections::BTreeMap;

use tracing::info;

use crate::engine::StopFlag;
use crate::errors::{ProvisionError, Result};
use crate::schedule::sequence::TaskSequence;
use crate::task::Task;
use crate::types::ExclusivityRule;

/// What happened to a task handed to [`Scheduler::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Scheduled,
    /// Dropped because of an exclusive job.
    Superseded,
}

/// Tasks ordered by key, with the exclusivity rule applied on insertion.
///
/// Under [`ExclusivityRule::ExclusiveWins`] the held set is always either
/// "no exclusive task" or "exactly one exclusive task and nothing else",
/// where that task has the lowest key of all exclusive tasks seen so far.
#[derive(Debug)]
pub struct Scheduler {
    tasks: BTreeMap<u64, Task>,
    rule: ExclusivityRule,
    /// Key of the held exclusive task (`ExclusiveWins`), or whether one has
    /// been seen at all (`FirstCome`).
    exclusive: Option<u64>,
}

impl Scheduler {
    pub fn new(rule: ExclusivityRule) -> Self {
        Self {
            tasks: BTreeMap::new(),
            rule,
            exclusive: None,
        }
    }

    pub fn rule(&self) -> ExclusivityRule {
        self.rule
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Scheduled tasks in execution order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Offer a task. Fails if a task with the same key is already held.
    pub fn add(&mut self, task: Task) -> Result<Admission> {
        let key = task.order_key();
        if let Some(existing) = self.tasks.get(&key) {
            return Err(ProvisionError::JobEntryError {
                key: (key as i64).to_string(),
                message: format!("order key already used by '{}'", existing.name()),
            });
        }

        match self.rule {
            ExclusivityRule::ExclusiveWins => Ok(self.add_exclusive_wins(task)),
            ExclusivityRule::FirstCome => Ok(self.add_first_come(task)),
        }
    }

    fn add_exclusive_wins(&mut self, task: Task) -> Admission {
        let key = task.order_key();
        match (self.exclusive, task.is_exclusive()) {
            (Some(_), false) => Admission::Superseded,
            (Some(held), true) if held < key => Admission::Superseded,
            (_, true) => {
                for dropped in std::mem::take(&mut self.tasks).into_values() {
                    info!(task = %dropped.name(), exclusive = %task.name(), "job dropped: superseded by an exclusive job");
                }
                self.exclusive = Some(key);
                self.tasks.insert(key, task);
                Admission::Scheduled
            }
            (None, false) => {
                self.tasks.insert(key, task);
                Admission::Scheduled
            }
        }
    }

    fn add_first_come(&mut self, task: Task) -> Admission {
        if self.exclusive.is_some() {
            return Admission::Superseded;
        }
        let key = task.order_key();
        if task.is_exclusive() {
            self.exclusive = Some(key);
            if !self.tasks.is_empty() {
                return Admission::Superseded;
            }
        }
        self.tasks.insert(key, task);
        Admission::Scheduled
    }

    /// Consume the scheduler into the lazy sequence the run loop pulls from.
    pub fn into_sequence(self, stop: StopFlag) -> TaskSequence {
        TaskSequence::new(self.tasks, stop)
    }
}
