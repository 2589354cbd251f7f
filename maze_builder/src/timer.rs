// timer.rs - Play-time counter and best-time record

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::animation::{Scheduler, Step, TaskHandle};

/// Longest time the display can show (59:59)
pub const TIMER_CAP: Duration = Duration::from_secs(59 * 60 + 59);

/// `mm:ss`, saturating at 59:59
pub fn format_mm_ss(seconds: u64) -> String {
    let seconds = seconds.min(TIMER_CAP.as_secs());
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Counts play time on the scheduler; stops by itself at the cap
pub struct RunTimer {
    scheduler: Scheduler,
    elapsed: Rc<Cell<Duration>>,
    task: Option<TaskHandle>,
}

impl RunTimer {
    pub fn new(scheduler: &Scheduler) -> Self {
        Self {
            scheduler: scheduler.clone(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
            task: None,
        }
    }

    /// Resume counting from the current value
    pub fn start(&mut self) {
        let elapsed = self.elapsed.clone();
        self.scheduler.replace_labeled(&mut self.task, "run-timer", move |dt: Duration| {
            let total = elapsed.get() + dt;
            if total >= TIMER_CAP {
                elapsed.set(TIMER_CAP);
                debug!("Run timer reached its cap");
                return Step::Done;
            }
            elapsed.set(total);
            Step::Continue
        });
    }

    pub fn stop(&mut self) {
        self.scheduler.stop(&mut self.task);
    }

    pub fn reset(&mut self) {
        self.stop();
        self.elapsed.set(Duration::ZERO);
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some_and(|handle| self.scheduler.is_active(handle))
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    pub fn seconds_elapsed(&self) -> u64 {
        self.elapsed.get().as_secs()
    }

    pub fn display(&self) -> String {
        format_mm_ss(self.seconds_elapsed())
    }
}

/// Fastest finish so far, in whole seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestTime {
    best: Option<u64>,
}

impl BestTime {
    pub fn best(&self) -> Option<u64> {
        self.best
    }

    /// Returns true when `seconds` is a new record (first finish or strictly faster)
    pub fn record(&mut self, seconds: u64) -> bool {
        match self.best {
            Some(best) if seconds >= best => false,
            _ => {
                self.best = Some(seconds);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(61), "01:01");
        assert_eq!(format_mm_ss(3599), "59:59");
        assert_eq!(format_mm_ss(10_000), "59:59");
    }

    #[test]
    fn test_counts_while_running() {
        let scheduler = Scheduler::new();
        let mut timer = RunTimer::new(&scheduler);
        timer.start();
        for _ in 0..5 {
            scheduler.tick(Duration::from_millis(500));
        }
        assert_eq!(timer.seconds_elapsed(), 2);
        assert!(timer.is_running());

        timer.stop();
        scheduler.tick(Duration::from_secs(10));
        assert_eq!(timer.seconds_elapsed(), 2);
        assert!(!timer.is_running());

        timer.reset();
        assert_eq!(timer.display(), "00:00");
    }

    #[test]
    fn test_stops_at_cap() {
        let scheduler = Scheduler::new();
        let mut timer = RunTimer::new(&scheduler);
        timer.start();
        scheduler.tick(Duration::from_secs(3000));
        scheduler.tick(Duration::from_secs(3000));

        assert_eq!(timer.elapsed(), TIMER_CAP);
        assert_eq!(timer.display(), "59:59");
        assert!(!timer.is_running());
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_restart_does_not_double_count() {
        let scheduler = Scheduler::new();
        let mut timer = RunTimer::new(&scheduler);
        timer.start();
        timer.start();
        scheduler.tick(Duration::from_secs(1));
        assert_eq!(timer.seconds_elapsed(), 1);
    }

    #[test]
    fn test_best_time() {
        let mut best = BestTime::default();
        assert!(best.record(90));
        assert!(!best.record(90));
        assert!(!best.record(120));
        assert!(best.record(45));
        assert_eq!(best.best(), Some(45));
    }
}
