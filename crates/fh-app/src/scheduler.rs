//! Single-threaded cooperative scheduler.
//!
//! Tasks are plain tags; the owner maps a due tag to the component to run.
//! Repeating tasks are re-armed from their previous due time, so a late
//! dispatch does not shift the cadence.

use std::sync::Arc;
use std::time::Duration;

use fh_core::Clock;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
struct Entry<T> {
    due: Duration,
    period: Duration,
    repeating: bool,
    seq: u64,
    task: T,
}

pub struct Scheduler<T> {
    clock: Arc<dyn Clock>,
    entries: Vec<Entry<T>>,
    next_seq: u64,
}

impl<T: Copy + PartialEq> Scheduler<T> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Run `task` one `period` from now, and every `period` after that if
    /// `repeating`.
    pub fn schedule(&mut self, period: Duration, repeating: bool, task: T) -> AppResult<()> {
        if repeating && period.is_zero() {
            return Err(AppError::Schedule {
                what: "repeating task needs a positive period",
            });
        }
        let due = self.clock.now() + period;
        self.entries.push(Entry {
            due,
            period,
            repeating,
            seq: self.next_seq,
            task,
        });
        self.next_seq += 1;
        Ok(())
    }

    /// Remove every pending entry for `task`.
    pub fn cancel(&mut self, task: T) {
        self.entries.retain(|e| e.task != task);
    }

    pub fn is_scheduled(&self, task: T) -> bool {
        self.entries.iter().any(|e| e.task == task)
    }

    /// Earliest due time of any pending task.
    pub fn next_due(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Take the next task due at or before `now`. Ties go to the task that
    /// was scheduled first.
    pub fn pop_due(&mut self, now: Duration) -> Option<T> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| (e.due, e.seq))
            .map(|(i, _)| i)?;

        let entry = &mut self.entries[index];
        let task = entry.task;
        if entry.repeating {
            entry.due += entry.period;
        } else {
            self.entries.swap_remove(index);
        }
        Some(task)
    }

    /// All tasks due at the clock's current time, in dispatch order.
    pub fn drain_due(&mut self) -> Vec<T> {
        let now = self.clock.now();
        std::iter::from_fn(|| self.pop_due(now)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
