//! Playback state machine for snapshot sequences.
//!
//! Pure transitions only: the machine never owns a timer. Every transition
//! returns a [`Transition`] telling the owner whether to arm or cancel its one
//! tick timer and which snapshot, if any, became current.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackPhase {
    /// No sequence, an empty one, or loaded but not started
    #[default]
    Idle,
    Playing,
    Paused,
    /// Last snapshot revealed; only `restart` leaves this state
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub current_index: usize,
    pub is_playing: bool,
    pub is_complete: bool,
    pub phase: PlaybackPhase,
    pub total_steps: usize,
    /// Bumped whenever the sequence is loaded or rewound
    pub generation: u64,
}

/// What the timer owner has to do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerDirective {
    /// Leave the timer as it is
    Keep,
    /// Replace any running timer with a fresh one
    Arm,
    /// Drop the timer; a no-op when none runs
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub timer: TimerDirective,
    /// Snapshot index that just became current
    pub reveal: Option<usize>,
    pub completed: bool,
}

impl Transition {
    fn keep() -> Self {
        Self {
            timer: TimerDirective::Keep,
            reveal: None,
            completed: false,
        }
    }

    fn cancel() -> Self {
        Self {
            timer: TimerDirective::Cancel,
            reveal: None,
            completed: false,
        }
    }

    fn arm(reveal: Option<usize>) -> Self {
        Self {
            timer: TimerDirective::Arm,
            reveal,
            completed: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaybackMachine {
    len: usize,
    phase: PlaybackPhase,
    current_index: usize,
    generation: u64,
}

impl PlaybackMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Run counter; reveals from an older run are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            current_index: self.current_index,
            is_playing: self.phase == PlaybackPhase::Playing,
            is_complete: self.phase == PlaybackPhase::Complete,
            phase: self.phase,
            total_steps: self.len,
            generation: self.generation,
        }
    }

    /// New sequence: reset to the first snapshot without starting.
    pub fn load(&mut self, len: usize) -> Transition {
        self.len = len;
        self.current_index = 0;
        self.phase = PlaybackPhase::Idle;
        self.generation += 1;
        Transition::cancel()
    }

    /// Load `len` snapshots and play from the first one.
    pub fn start(&mut self, len: usize) -> Transition {
        self.load(len);
        self.play_from_start()
    }

    pub fn restart(&mut self) -> Transition {
        self.current_index = 0;
        self.generation += 1;
        self.play_from_start()
    }

    fn play_from_start(&mut self) -> Transition {
        if self.len == 0 {
            self.phase = PlaybackPhase::Idle;
            return Transition::cancel();
        }
        self.current_index = 0;
        self.phase = PlaybackPhase::Playing;
        Transition::arm(Some(0))
    }

    /// Timer fired: advance by exactly one. The tick that reveals the last
    /// snapshot also completes playback and cancels the timer.
    pub fn tick(&mut self) -> Transition {
        if self.phase != PlaybackPhase::Playing {
            return Transition::cancel();
        }
        if self.current_index + 1 < self.len {
            self.current_index += 1;
            let last = self.current_index + 1 == self.len;
            if last {
                self.phase = PlaybackPhase::Complete;
            }
            Transition {
                timer: if last {
                    TimerDirective::Cancel
                } else {
                    TimerDirective::Keep
                },
                reveal: Some(self.current_index),
                completed: last,
            }
        } else {
            self.phase = PlaybackPhase::Complete;
            Transition {
                timer: TimerDirective::Cancel,
                reveal: None,
                completed: true,
            }
        }
    }

    pub fn pause(&mut self) -> Transition {
        match self.phase {
            PlaybackPhase::Playing => {
                self.phase = PlaybackPhase::Paused;
                Transition::cancel()
            }
            _ => Transition::keep(),
        }
    }

    /// Continue from the current index; only meaningful while paused.
    pub fn resume(&mut self) -> Transition {
        match self.phase {
            PlaybackPhase::Paused => {
                self.phase = PlaybackPhase::Playing;
                Transition::arm(None)
            }
            _ => Transition::keep(),
        }
    }

    /// Play/pause control: pause while playing, resume while paused, start a
    /// loaded sequence, replay a finished one.
    pub fn toggle(&mut self) -> Transition {
        match self.phase {
            PlaybackPhase::Playing => self.pause(),
            PlaybackPhase::Paused => self.resume(),
            PlaybackPhase::Idle | PlaybackPhase::Complete => self.restart(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_five_steps_when_ticking_then_advances_one_by_one_and_completes() {
        let mut machine = PlaybackMachine::new();
        let started = machine.start(5);
        assert_eq!(started.timer, TimerDirective::Arm);
        assert_eq!(started.reveal, Some(0));

        for expected in 1..4 {
            let t = machine.tick();
            assert_eq!(t.reveal, Some(expected));
            assert_eq!(t.timer, TimerDirective::Keep);
            assert!(!t.completed);
            assert_eq!(machine.current_index(), expected);
        }

        let last = machine.tick();
        assert_eq!(last.reveal, Some(4));
        assert!(last.completed);
        assert_eq!(last.timer, TimerDirective::Cancel);
        assert_eq!(machine.current_index(), 4);
        assert!(machine.state().is_complete);
        assert!(!machine.state().is_playing);

        // Complete is terminal for ticks
        assert_eq!(machine.tick().reveal, None);
        assert_eq!(machine.current_index(), 4);
    }

    #[test]
    fn given_single_snapshot_when_ticking_then_completes_without_reveal() {
        let mut machine = PlaybackMachine::new();
        assert_eq!(machine.start(1).reveal, Some(0));

        let t = machine.tick();

        assert!(t.completed);
        assert_eq!(t.reveal, None);
        assert_eq!(machine.phase(), PlaybackPhase::Complete);
    }

    #[test]
    fn given_empty_sequence_when_starting_then_stays_idle() {
        let mut machine = PlaybackMachine::new();
        let t = machine.start(0);
        assert_eq!(t.timer, TimerDirective::Cancel);
        assert_eq!(machine.phase(), PlaybackPhase::Idle);
        assert_eq!(machine.tick().reveal, None);
    }

    #[test]
    fn given_paused_player_when_ticking_then_index_frozen() {
        let mut machine = PlaybackMachine::new();
        machine.start(5);
        machine.tick();
        machine.pause();

        for _ in 0..10 {
            machine.tick();
        }

        assert_eq!(machine.current_index(), 1);
        assert_eq!(machine.phase(), PlaybackPhase::Paused);
    }

    #[test]
    fn given_paused_player_when_resuming_then_continues_without_reset() {
        let mut machine = PlaybackMachine::new();
        machine.start(5);
        machine.tick();
        machine.tick();
        machine.pause();

        let t = machine.resume();

        assert_eq!(t.timer, TimerDirective::Arm);
        assert_eq!(t.reveal, None);
        assert_eq!(machine.tick().reveal, Some(3));
    }

    #[test]
    fn given_complete_player_when_restarting_then_back_to_zero() {
        let mut machine = PlaybackMachine::new();
        machine.start(2);
        machine.tick();
        assert_eq!(machine.phase(), PlaybackPhase::Complete);

        let t = machine.restart();

        assert_eq!(t.reveal, Some(0));
        assert_eq!(machine.current_index(), 0);
        assert!(!machine.state().is_complete);
        assert!(machine.state().is_playing);
    }

    #[test]
    fn given_repeated_pause_when_idle_or_paused_then_noop() {
        let mut machine = PlaybackMachine::new();
        assert_eq!(machine.pause().timer, TimerDirective::Keep);

        machine.start(3);
        assert_eq!(machine.pause().timer, TimerDirective::Cancel);
        assert_eq!(machine.pause().timer, TimerDirective::Keep);
        assert_eq!(machine.phase(), PlaybackPhase::Paused);
    }

    #[test]
    fn given_new_sequence_when_loading_then_resets_without_playing() {
        let mut machine = PlaybackMachine::new();
        machine.start(3);
        machine.tick();

        let t = machine.load(7);

        assert_eq!(t.timer, TimerDirective::Cancel);
        assert_eq!(machine.state().current_index, 0);
        assert_eq!(machine.state().total_steps, 7);
        assert_eq!(machine.phase(), PlaybackPhase::Idle);
    }

    #[test]
    fn given_rewinds_when_tracking_generation_then_only_load_and_restart_bump_it() {
        let mut machine = PlaybackMachine::new();
        machine.start(3);
        let first = machine.generation();

        machine.tick();
        machine.pause();
        machine.resume();
        assert_eq!(machine.generation(), first);

        machine.restart();
        assert_eq!(machine.generation(), first + 1);

        machine.load(2);
        assert_eq!(machine.state().generation, first + 2);
    }

    #[test]
    fn given_each_phase_when_toggling_then_follows_play_pause_rules() {
        let mut machine = PlaybackMachine::new();
        machine.load(3);

        assert_eq!(machine.toggle().reveal, Some(0));
        assert_eq!(machine.phase(), PlaybackPhase::Playing);

        machine.toggle();
        assert_eq!(machine.phase(), PlaybackPhase::Paused);

        machine.toggle();
        assert_eq!(machine.phase(), PlaybackPhase::Playing);

        machine.tick();
        machine.tick();
        assert_eq!(machine.phase(), PlaybackPhase::Complete);

        assert_eq!(machine.toggle().reveal, Some(0));
        assert_eq!(machine.phase(), PlaybackPhase::Playing);
    }
}
