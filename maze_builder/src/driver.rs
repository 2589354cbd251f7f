// driver.rs - Tick loops that pump a scheduler until construction settles

use std::time::Duration;

use log::{debug, warn};

use crate::animation::{ConstructionSequencer, Phase, Scheduler};

/// Tick as fast as possible until the sequencer reaches `Done`.
/// Returns the number of ticks used, or `None` if `max_ticks` ran out first.
pub fn run_to_completion(
    scheduler: &Scheduler,
    sequencer: &ConstructionSequencer,
    tick: Duration,
    max_ticks: u64,
) -> Option<u64> {
    for ticks in 0..max_ticks {
        if sequencer.phase() == Phase::Done {
            debug!("Construction settled after {ticks} ticks");
            return Some(ticks);
        }
        scheduler.tick(tick);
    }

    (sequencer.phase() == Phase::Done).then_some(max_ticks).or_else(|| {
        warn!("Construction still in {:?} after {max_ticks} ticks", sequencer.phase());
        None
    })
}

/// Same as [`run_to_completion`] but paced by a tokio interval, one tick per period
pub async fn run_realtime(
    scheduler: &Scheduler,
    sequencer: &ConstructionSequencer,
    tick: Duration,
    max_ticks: u64,
) -> Option<u64> {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    for ticks in 0..max_ticks {
        if sequencer.phase() == Phase::Done {
            return Some(ticks);
        }
        interval.tick().await;
        scheduler.tick(tick);
    }

    if sequencer.phase() == Phase::Done {
        Some(max_ticks)
    } else {
        warn!("Realtime construction did not settle within {max_ticks} ticks");
        None
    }
}

/// Run any remaining scheduled work (camera moves, timers) for `duration`
pub fn drain(scheduler: &Scheduler, tick: Duration, duration: Duration) {
    let mut remaining = duration;
    while !remaining.is_zero() && scheduler.active_count() > 0 {
        scheduler.tick(tick);
        remaining = remaining.saturating_sub(tick);
    }
}
