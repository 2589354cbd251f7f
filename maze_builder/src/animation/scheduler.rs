// animation/scheduler.rs - Cooperative tick-driven task host
//
// Every animation in the crate (tweens, staggered light activation, the
// construction sequence itself) is a `Task` registered here. A task lives until
// it reports `Step::Done` or is cancelled; dropping whatever created it does not
// stop it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use log::{debug, trace};

/// What a task wants after advancing once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Advance again on the next tick
    Continue,
    /// Sleep until this much tick time has accumulated, then advance
    WaitFor(Duration),
    /// Finished; the task is dropped
    Done,
}

/// A suspendable unit of work advanced by the scheduler
pub trait Task {
    fn step(&mut self, dt: Duration) -> Step;
}

impl<F> Task for F
where
    F: FnMut(Duration) -> Step,
{
    #[inline]
    fn step(&mut self, dt: Duration) -> Step {
        self(dt)
    }
}

/// Opaque reference to a scheduled task, used for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

struct Entry {
    id: u64,
    label: &'static str,
    wait: Duration,
    // Taken out while the task is stepping so the registry is never borrowed
    // across user code.
    task: Option<Box<dyn Task>>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    // Ordered by id == registration order
    entries: Vec<Entry>,
}

impl Registry {
    #[inline]
    fn position(&self, id: u64) -> Option<usize> {
        self.entries.binary_search_by_key(&id, |e| e.id).ok()
    }
}

/// Explicitly constructed task host. Clones share one registry; separately
/// constructed schedulers are fully independent.
#[derive(Clone, Default)]
pub struct Scheduler {
    registry: Rc<RefCell<Registry>>,
    ticks: Rc<Cell<u64>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin running `task` from the next tick
    pub fn schedule<T: Task + 'static>(&self, task: T) -> TaskHandle {
        self.schedule_labeled("task", task)
    }

    pub fn schedule_labeled<T: Task + 'static>(&self, label: &'static str, task: T) -> TaskHandle {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.entries.push(Entry {
            id,
            label,
            wait: Duration::ZERO,
            task: Some(Box::new(task)),
        });
        trace!("Scheduled {label} task #{id}");
        TaskHandle(id)
    }

    /// Remove the task if still active. Returns false when it already finished.
    pub fn cancel(&self, handle: TaskHandle) -> bool {
        let removed = {
            let mut registry = self.registry.borrow_mut();
            registry
                .position(handle.0)
                .map(|index| registry.entries.remove(index))
        };

        // Dropped after the borrow ends: captured state may reach back into the scheduler
        match removed {
            Some(entry) => {
                debug!("Cancelled {} task #{}", entry.label, entry.id);
                drop(entry);
                true
            }
            None => false,
        }
    }

    /// Cancel and clear whatever occupies `slot`
    pub fn stop(&self, slot: &mut Option<TaskHandle>) {
        if let Some(handle) = slot.take() {
            self.cancel(handle);
        }
    }

    /// Cancel the slot's current task (if any) before starting `task` in it
    pub fn replace<T: Task + 'static>(&self, slot: &mut Option<TaskHandle>, task: T) -> TaskHandle {
        self.replace_labeled(slot, "task", task)
    }

    pub fn replace_labeled<T: Task + 'static>(
        &self,
        slot: &mut Option<TaskHandle>,
        label: &'static str,
        task: T,
    ) -> TaskHandle {
        self.stop(slot);
        let handle = self.schedule_labeled(label, task);
        *slot = Some(handle);
        handle
    }

    pub fn is_active(&self, handle: TaskHandle) -> bool {
        self.registry.borrow().position(handle.0).is_some()
    }

    pub fn active_count(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks.get()
    }

    /// System-wide teardown: drop every task without advancing it
    pub fn clear(&self) {
        let entries = std::mem::take(&mut self.registry.borrow_mut().entries);
        if !entries.is_empty() {
            debug!("Clearing {} scheduled tasks", entries.len());
        }
        drop(entries);
    }

    /// Advance every task registered before this call exactly once, in
    /// registration order. Tasks scheduled during the tick start next tick;
    /// tasks cancelled during the tick are not advanced again.
    pub fn tick(&self, dt: Duration) {
        self.ticks.set(self.ticks.get() + 1);
        let ids: Vec<u64> = self.registry.borrow().entries.iter().map(|e| e.id).collect();

        for id in ids {
            let mut task = {
                let mut registry = self.registry.borrow_mut();
                let Some(index) = registry.position(id) else {
                    continue;
                };
                let entry = &mut registry.entries[index];

                if entry.wait > Duration::ZERO {
                    entry.wait = entry.wait.saturating_sub(dt);
                    if entry.wait > Duration::ZERO {
                        continue;
                    }
                }

                // Already stepping further up the stack (nested tick)
                let Some(task) = entry.task.take() else {
                    continue;
                };
                task
            };

            let step = task.step(dt);

            let finished = {
                let mut registry = self.registry.borrow_mut();
                match (registry.position(id), step) {
                    (Some(index), Step::Done) => {
                        let entry = registry.entries.remove(index);
                        trace!("Finished {} task #{}", entry.label, entry.id);
                        Some(task)
                    }
                    (Some(index), Step::WaitFor(wait)) => {
                        let entry = &mut registry.entries[index];
                        entry.wait = wait;
                        entry.task = Some(task);
                        None
                    }
                    (Some(index), Step::Continue) => {
                        registry.entries[index].task = Some(task);
                        None
                    }
                    // Cancelled while it was stepping
                    (None, _) => Some(task),
                }
            };
            drop(finished);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(10);

    fn counter(hits: &Rc<Cell<u32>>) -> impl FnMut(Duration) -> Step {
        let hits = hits.clone();
        move |_dt| {
            hits.set(hits.get() + 1);
            Step::Continue
        }
    }

    #[test]
    fn test_each_task_advances_once_per_tick() {
        let scheduler = Scheduler::new();
        let a = Rc::new(Cell::new(0));
        let b = Rc::new(Cell::new(0));
        scheduler.schedule(counter(&a));
        scheduler.schedule(counter(&b));

        scheduler.tick(FRAME);
        scheduler.tick(FRAME);
        assert_eq!((a.get(), b.get()), (2, 2));
        assert_eq!(scheduler.active_count(), 2);
        assert_eq!(scheduler.tick_count(), 2);
    }

    #[test]
    fn test_registration_order_within_tick() {
        let scheduler = Scheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let order = order.clone();
            scheduler.schedule(move |_dt: Duration| {
                order.borrow_mut().push(n);
                Step::Done
            });
        }
        scheduler.tick(FRAME);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_done_removes_task() {
        let scheduler = Scheduler::new();
        let handle = scheduler.schedule(|_dt: Duration| Step::Done);
        assert!(scheduler.is_active(handle));
        scheduler.tick(FRAME);
        assert!(!scheduler.is_active(handle));
        assert!(!scheduler.cancel(handle));
    }

    #[test]
    fn test_wait_for_skips_ticks() {
        let scheduler = Scheduler::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        scheduler.schedule(move |_dt: Duration| {
            h.set(h.get() + 1);
            Step::WaitFor(Duration::from_millis(30))
        });

        scheduler.tick(FRAME); // runs, then waits 30ms
        assert_eq!(hits.get(), 1);
        scheduler.tick(FRAME);
        scheduler.tick(FRAME);
        assert_eq!(hits.get(), 1);
        scheduler.tick(FRAME); // 30ms accumulated
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_cancel_stops_further_steps() {
        let scheduler = Scheduler::new();
        let hits = Rc::new(Cell::new(0));
        let handle = scheduler.schedule(counter(&hits));
        scheduler.tick(FRAME);
        assert!(scheduler.cancel(handle));
        scheduler.tick(FRAME);
        assert_eq!(hits.get(), 1);
        assert!(!scheduler.cancel(handle));
    }

    #[test]
    fn test_cancel_later_task_during_tick() {
        let scheduler = Scheduler::new();
        let victim_hits = Rc::new(Cell::new(0));
        let victim_slot: Rc<Cell<Option<TaskHandle>>> = Rc::new(Cell::new(None));

        let s = scheduler.clone();
        let slot = victim_slot.clone();
        scheduler.schedule(move |_dt: Duration| {
            if let Some(handle) = slot.take() {
                s.cancel(handle);
            }
            Step::Done
        });
        victim_slot.set(Some(scheduler.schedule(counter(&victim_hits))));

        scheduler.tick(FRAME);
        assert_eq!(victim_hits.get(), 0);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_task_cancelling_itself() {
        let scheduler = Scheduler::new();
        let me: Rc<Cell<Option<TaskHandle>>> = Rc::new(Cell::new(None));
        let s = scheduler.clone();
        let slot = me.clone();
        let handle = scheduler.schedule(move |_dt: Duration| {
            if let Some(h) = slot.get() {
                s.cancel(h);
            }
            Step::Continue
        });
        me.set(Some(handle));

        scheduler.tick(FRAME);
        assert!(!scheduler.is_active(handle));
    }

    #[test]
    fn test_scheduled_during_tick_runs_next_tick() {
        let scheduler = Scheduler::new();
        let child_hits = Rc::new(Cell::new(0));

        let s = scheduler.clone();
        let hits = child_hits.clone();
        scheduler.schedule(move |_dt: Duration| {
            s.schedule(counter(&hits));
            Step::Done
        });

        scheduler.tick(FRAME);
        assert_eq!(child_hits.get(), 0);
        scheduler.tick(FRAME);
        assert_eq!(child_hits.get(), 1);
    }

    #[test]
    fn test_replace_cancels_previous_occupant() {
        let scheduler = Scheduler::new();
        let old_hits = Rc::new(Cell::new(0));
        let new_hits = Rc::new(Cell::new(0));
        let mut slot = None;

        let first = scheduler.replace(&mut slot, counter(&old_hits));
        scheduler.tick(FRAME);
        let second = scheduler.replace(&mut slot, counter(&new_hits));
        scheduler.tick(FRAME);
        scheduler.tick(FRAME);

        assert_ne!(first, second);
        assert_eq!(slot, Some(second));
        assert_eq!(old_hits.get(), 1);
        assert_eq!(new_hits.get(), 2);
        assert!(!scheduler.is_active(first));

        scheduler.stop(&mut slot);
        assert_eq!(slot, None);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_independent_schedulers() {
        let a = Scheduler::new();
        let b = Scheduler::new();
        let hits = Rc::new(Cell::new(0));
        a.schedule(counter(&hits));
        b.tick(FRAME);
        assert_eq!(hits.get(), 0);
        assert_eq!(b.active_count(), 0);
    }

    #[test]
    fn test_clear_drops_everything() {
        let scheduler = Scheduler::new();
        let hits = Rc::new(Cell::new(0));
        scheduler.schedule(counter(&hits));
        scheduler.schedule(counter(&hits));
        scheduler.clear();
        scheduler.tick(FRAME);
        assert_eq!(hits.get(), 0);
        assert_eq!(scheduler.active_count(), 0);
    }
}
