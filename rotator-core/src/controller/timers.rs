use std::time::Duration;

use super::events::{Effect, TimerKind};

/// Generation bookkeeping for the controller's timers.
///
/// Arming a kind bumps its generation, so a timer that fires after being
/// replaced or cancelled is recognised as stale. A fired timer is accepted at
/// most once.
#[derive(Debug, Default)]
pub(crate) struct TimerSet {
    generations: [u64; 4],
    armed: [Option<u64>; 4],
}

impl TimerSet {
    pub fn arm(
        &mut self,
        kind: TimerKind,
        after: Duration,
        effects: &mut Vec<Effect>,
    ) {
        let slot = kind.index();
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        let generation = self.generations[slot];
        self.armed[slot] = Some(generation);
        effects.push(Effect::StartTimer {
            kind,
            generation,
            after,
        });
    }

    pub fn disarm(&mut self, kind: TimerKind, effects: &mut Vec<Effect>) {
        let slot = kind.index();
        if self.armed[slot].take().is_some() {
            self.generations[slot] = self.generations[slot].wrapping_add(1);
            effects.push(Effect::CancelTimer(kind));
        }
    }

    pub fn accept(&mut self, kind: TimerKind, generation: u64) -> bool {
        let slot = kind.index();
        if self.armed[slot] == Some(generation) {
            self.armed[slot] = None;
            true
        } else {
            false
        }
    }
}
