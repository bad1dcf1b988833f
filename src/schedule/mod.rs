// src/schedule/mod.rs

//! Sequencing scheduler.
//!
//! - [`loader`] walks the job source, loads each job document and hands the
//!   resulting tasks to the scheduler.
//! - [`scheduler`] keeps the tasks ordered by key and applies the
//!   exclusivity rule as they arrive.
//! - [`sequence`] is the lazy, stop-aware stream the run loop pulls from.

pub mod loader;
pub mod scheduler;
pub mod sequence;

pub use loader::load_schedule;
pub use scheduler::{Admission, Scheduler};
pub use sequence::TaskSequence;
