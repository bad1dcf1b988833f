// src/schedule/loader.rs

use tracing::{debug, error, info};

use crate::errors::{ProvisionError, Result};
use crate::schedule::scheduler::{Admission, Scheduler};
use crate::setup::{JobEntry, JobSource, load_descriptor};
use crate::task::Task;
use crate::types::{BadEntryPolicy, ExclusivityRule};

/// Load every entry of `source` into a [`Scheduler`].
///
/// - A document that cannot be loaded is logged and skipped.
/// - A malformed entry (bad key, wrong value kind, duplicate key) is handled
///   according to `policy`; under [`BadEntryPolicy::Abort`] the error is
///   returned and nothing should run.
/// - An error reading the source itself is always returned.
pub fn load_schedule(
    source: &dyn JobSource,
    policy: BadEntryPolicy,
    rule: ExclusivityRule,
) -> Result<Scheduler> {
    let mut scheduler = Scheduler::new(rule);

    for entry in source.entries()? {
        let task = match load_entry(&entry) {
            Ok(Some(task)) => task,
            Ok(None) => continue,
            Err(e) => {
                reject(policy, e)?;
                continue;
            }
        };

        let name = task.name().to_string();
        match scheduler.add(task) {
            Ok(Admission::Scheduled) => debug!(key = %entry.key, task = %name, "job scheduled"),
            Ok(Admission::Superseded) => {
                info!(key = %entry.key, task = %name, "job dropped: superseded by an exclusive job")
            }
            Err(e) => reject(policy, e)?,
        }
    }

    info!(count = scheduler.len(), "jobs loaded");
    Ok(scheduler)
}

/// `Ok(None)` when the document itself could not be loaded.
fn load_entry(entry: &JobEntry) -> Result<Option<Task>> {
    let key = entry.order_key()?;
    let path = entry.document_path()?;

    match load_descriptor(&path) {
        Ok(descriptor) => Ok(Some(Task::new(key, &path, descriptor))),
        Err(e) => {
            error!(key = %entry.key, path = %path.display(), error = %e, "could not load job document; skipping");
            Ok(None)
        }
    }
}

fn reject(policy: BadEntryPolicy, err: ProvisionError) -> Result<()> {
    match policy {
        BadEntryPolicy::Skip => {
            error!(error = %err, "bad job entry; skipping");
            Ok(())
        }
        BadEntryPolicy::Abort => {
            error!(error = %err, "bad job entry; aborting");
            Err(err)
        }
    }
}
