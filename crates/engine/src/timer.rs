use std::collections::HashMap;

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

pub type TimerCallback<C> = Box<dyn FnOnce(&mut C)>;

struct Timer<C> {
    remaining_ms: f32,
    callback: TimerCallback<C>,
}

/// One-shot deferred callbacks counted down by simulation time.
///
/// A timer fires on the first `update` that brings its remaining time to
/// zero or below, so with coarse ticks it fires late rather than early.
/// Timers expiring on the same update fire in no particular order.
pub struct TimerManager<C> {
    timers: HashMap<TimerId, Timer<C>>,
    next_id: u64,
    paused: bool,
}

impl<C> Default for TimerManager<C> {
    fn default() -> Self {
        Self {
            timers: HashMap::new(),
            next_id: 0,
            paused: false,
        }
    }
}

impl<C> TimerManager<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_timer(
        &mut self,
        delay_ms: f32,
        callback: impl FnOnce(&mut C) + 'static,
    ) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.timers.insert(
            id,
            Timer {
                remaining_ms: delay_ms,
                callback: Box::new(callback),
            },
        );
        id
    }

    /// Cancels a pending timer. Returns false if it already fired or was cleared.
    pub fn clear_timer(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    pub fn set_pause(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn update(&mut self, delta_ms: f32, cx: &mut C) {
        if self.paused {
            return;
        }

        let mut expired = Vec::new();
        for (id, timer) in self.timers.iter_mut() {
            timer.remaining_ms -= delta_ms;
            if timer.remaining_ms <= 0.0 {
                expired.push(*id);
            }
        }

        for id in expired {
            if let Some(timer) = self.timers.remove(&id) {
                trace!(timer = id.0, overshoot_ms = -timer.remaining_ms, "timer_fired");
                (timer.callback)(cx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_on_tick_that_crosses_zero() {
        let mut timers: TimerManager<u32> = TimerManager::new();
        let mut fired = 0;
        timers.set_timer(500.0, |count| *count += 1);

        timers.update(200.0, &mut fired);
        assert_eq!(fired, 0);
        timers.update(200.0, &mut fired);
        assert_eq!(fired, 0);
        timers.update(200.0, &mut fired);
        assert_eq!(fired, 1);
        timers.update(200.0, &mut fired);
        assert_eq!(fired, 1);
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn exact_zero_counts_as_expired() {
        let mut timers: TimerManager<u32> = TimerManager::new();
        let mut fired = 0;
        timers.set_timer(100.0, |count| *count += 1);
        timers.update(100.0, &mut fired);
        assert_eq!(fired, 1);
    }

    #[test]
    fn cleared_timer_never_fires() {
        let mut timers: TimerManager<Vec<&'static str>> = TimerManager::new();
        let mut log = Vec::new();
        let keep = timers.set_timer(10.0, |log| log.push("keep"));
        let drop = timers.set_timer(10.0, |log| log.push("drop"));

        assert!(timers.clear_timer(drop));
        assert!(!timers.clear_timer(drop));
        timers.update(10.0, &mut log);

        assert_eq!(log, vec!["keep"]);
        assert!(!timers.is_pending(keep));
    }

    #[test]
    fn pause_freezes_countdown_without_dropping_timers() {
        let mut timers: TimerManager<u32> = TimerManager::new();
        let mut fired = 0;
        timers.set_timer(50.0, |count| *count += 1);

        timers.set_pause(true);
        timers.update(1_000.0, &mut fired);
        assert_eq!(fired, 0);
        assert_eq!(timers.pending_count(), 1);

        timers.set_pause(false);
        timers.update(30.0, &mut fired);
        assert_eq!(fired, 0);
        timers.update(30.0, &mut fired);
        assert_eq!(fired, 1);
    }

    #[test]
    fn handles_are_monotonic() {
        let mut timers: TimerManager<()> = TimerManager::new();
        let first = timers.set_timer(1.0, |_| {});
        let second = timers.set_timer(1.0, |_| {});
        assert!(second.0 > first.0);
    }
}
