//! Step counter and checkpoint cadence.

use gale_core::StepId;

/// Global step counter of a run.
///
/// Checkpoints fall every `interval` steps counted from `start`, never on
/// `start` itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimClock {
    start: StepId,
    current: StepId,
    final_step: StepId,
    interval: u64,
}

impl SimClock {
    /// A clock at `start`. `interval` must be at least 1.
    pub fn new(start: StepId, final_step: StepId, interval: u64) -> Self {
        debug_assert!(interval >= 1);
        Self {
            start,
            current: start,
            final_step,
            interval: interval.max(1),
        }
    }

    /// Move the start, and the current step, to a recovered checkpoint step.
    pub fn restart_at(&mut self, step: StepId) {
        self.start = step;
        self.current = step;
    }

    /// Step the run started (or restarted) at.
    pub fn start(&self) -> StepId {
        self.start
    }

    /// Current step.
    pub fn current(&self) -> StepId {
        self.current
    }

    /// Step the run ends at.
    pub fn final_step(&self) -> StepId {
        self.final_step
    }

    /// Advance by one step and return the new current step.
    pub fn advance(&mut self) -> StepId {
        self.current = self.current.next();
        self.current
    }

    /// Whether a checkpoint is due at the current step.
    pub fn is_checkpoint_step(&self) -> bool {
        self.current != self.start && (self.current.0 - self.start.0) % self.interval == 0
    }

    /// Whether the final step has been reached.
    pub fn is_finished(&self) -> bool {
        self.current >= self.final_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoints(start: u64, interval: u64, steps: u64) -> Vec<u64> {
        let mut clock = SimClock::new(StepId(start), StepId(start + steps), interval);
        let mut out = Vec::new();
        while !clock.is_finished() {
            clock.advance();
            if clock.is_checkpoint_step() {
                out.push(clock.current().0);
            }
        }
        out
    }

    #[test]
    fn cold_start_cadence() {
        assert_eq!(checkpoints(0, 3, 10), vec![3, 6, 9]);
    }

    #[test]
    fn restarted_cadence_counts_from_start() {
        assert_eq!(checkpoints(7, 5, 12), vec![12, 17]);
    }

    #[test]
    fn never_checkpoints_at_start() {
        let clock = SimClock::new(StepId(10), StepId(20), 1);
        assert!(!clock.is_checkpoint_step());
        assert_eq!(checkpoints(10, 1, 3), vec![11, 12, 13]);
    }

    #[test]
    fn restart_moves_start() {
        let mut clock = SimClock::new(StepId(0), StepId(100), 4);
        clock.restart_at(StepId(42));
        assert_eq!(clock.start(), StepId(42));
        assert_eq!(clock.current(), StepId(42));
        assert!(!clock.is_checkpoint_step());
        for _ in 0..4 {
            clock.advance();
        }
        assert!(clock.is_checkpoint_step());
        assert_eq!(clock.current(), StepId(46));
    }

    #[test]
    fn finished_at_final_step() {
        let mut clock = SimClock::new(StepId(0), StepId(2), 1);
        assert!(!clock.is_finished());
        clock.advance();
        clock.advance();
        assert!(clock.is_finished());
    }
}
