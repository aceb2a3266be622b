// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Deferred work on a virtual clock.
//!
//! Nothing runs on its own: the owner advances the clock and runs the tasks
//! that became due, in due-time order (first scheduled first for equal
//! times). Tasks cannot be cancelled.

use std::time::Duration;

pub type Task<C> = Box<dyn FnOnce(&mut C)>;

struct Scheduled<C> {
    due: Duration,
    seq: u64,
    label: &'static str,
    task: Task<C>,
}

pub struct Scheduler<C> {
    now: Duration,
    next_seq: u64,
    queue: Vec<Scheduled<C>>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            queue: Vec::new(),
        }
    }

    /// Time elapsed since the scheduler was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Run `task` once `delay` has elapsed. A zero delay means "on the next
    /// advance", never "right now".
    pub fn schedule(
        &mut self,
        delay: Duration,
        label: &'static str,
        task: impl FnOnce(&mut C) + 'static,
    ) {
        log::trace!("Scheduling `{label}` in {delay:?}");
        self.queue.push(Scheduled {
            due: self.now + delay,
            seq: self.next_seq,
            label,
            task: Box::new(task),
        });
        self.next_seq += 1;
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_labels(&self) -> Vec<&'static str> {
        let mut queued: Vec<&Scheduled<C>> = self.queue.iter().collect();
        queued.sort_by_key(|s| (s.due, s.seq));
        queued.into_iter().map(|s| s.label).collect()
    }

    /// Take the earliest task due no later than `until`, moving the clock
    /// to its due time.
    pub fn pop_due(
        &mut self,
        until: Duration,
    ) -> Option<(&'static str, Task<C>)> {
        let index = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= until)
            .min_by_key(|(_, s)| (s.due, s.seq))
            .map(|(index, _)| index)?;
        let scheduled = self.queue.remove(index);
        self.now = self.now.max(scheduled.due);
        Some((scheduled.label, scheduled.task))
    }

    /// Move the clock forward to `until` once everything due has run.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

/// Advance `target`'s scheduler by `duration`, running every task that
/// becomes due, including ones scheduled by tasks run along the way.
pub fn run_due<C>(
    target: &mut C,
    duration: Duration,
    scheduler: impl Fn(&mut C) -> &mut Scheduler<C>,
) {
    let until = scheduler(target).now() + duration;
    while let Some((label, task)) = scheduler(target).pop_due(until) {
        log::trace!("Running `{label}`");
        task(target);
    }
    scheduler(target).settle(until);
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct Clock {
        scheduler: Scheduler<Clock>,
        ran: Vec<&'static str>,
    }

    fn advance(clock: &mut Clock, millis: u64) {
        run_due(clock, Duration::from_millis(millis), |c| &mut c.scheduler);
    }

    #[test]
    fn nothing_runs_until_advanced() {
        let mut clock = Clock::default();
        clock
            .scheduler
            .schedule(Duration::ZERO, "zero", |c| c.ran.push("zero"));
        assert!(clock.ran.is_empty());
        assert_eq!(clock.scheduler.pending(), 1);

        advance(&mut clock, 0);
        assert_eq!(clock.ran, vec!["zero"]);
        assert_eq!(clock.scheduler.pending(), 0);
    }

    #[test]
    fn tasks_run_in_due_order_then_fifo() {
        let mut clock = Clock::default();
        clock.scheduler.schedule(Duration::from_millis(200), "late", |c| {
            c.ran.push("late")
        });
        clock
            .scheduler
            .schedule(Duration::ZERO, "a", |c| c.ran.push("a"));
        clock
            .scheduler
            .schedule(Duration::ZERO, "b", |c| c.ran.push("b"));
        assert_eq!(clock.scheduler.pending_labels(), vec!["a", "b", "late"]);

        advance(&mut clock, 199);
        assert_eq!(clock.ran, vec!["a", "b"]);

        advance(&mut clock, 1);
        assert_eq!(clock.ran, vec!["a", "b", "late"]);
        assert_eq!(clock.scheduler.now(), Duration::from_millis(200));
    }

    #[test]
    fn tasks_scheduled_by_tasks_run_in_the_same_advance_when_due() {
        let mut clock = Clock::default();
        clock.scheduler.schedule(Duration::from_millis(10), "outer", |c| {
            c.ran.push("outer");
            c.scheduler
                .schedule(Duration::ZERO, "inner", |c| c.ran.push("inner"));
            c.scheduler.schedule(Duration::from_millis(100), "later", |c| {
                c.ran.push("later")
            });
        });

        advance(&mut clock, 50);
        assert_eq!(clock.ran, vec!["outer", "inner"]);
        assert_eq!(clock.scheduler.pending_labels(), vec!["later"]);

        advance(&mut clock, 60);
        assert_eq!(clock.ran, vec!["outer", "inner", "later"]);
    }
}
