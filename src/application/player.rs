//! Background step player
//!
//! Reveals a snapshot sequence at a fixed cadence without blocking the caller.
//! The player task owns the playback machine and its single tick timer; the
//! [`StepPlayer`] handle only sends commands, so the timer is never shared.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, instrument, trace};

use crate::domain::{PlaybackMachine, PlaybackState, SearchSnapshot, TimerDirective, Transition};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("playback delay must be greater than zero")]
    InvalidDelay,

    #[error("no async runtime available to schedule playback")]
    NoRuntime,

    #[error("step player has been disposed")]
    Disposed,

    #[error("step player task failed: {0}")]
    TaskFailed(String),
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;

/// Updates sent from the player task to its owner.
///
/// `generation` is the [`PlaybackState::generation`] of the run that produced
/// the event; events from an earlier run may still sit in the channel after a
/// load or restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Snapshot at `index` became current
    Revealed {
        generation: u64,
        index: usize,
        snapshot: SearchSnapshot,
    },
    /// The last snapshot stays on screen; no further ticks
    Completed { generation: u64, last_index: usize },
}

impl PlayerEvent {
    pub fn generation(&self) -> u64 {
        match self {
            PlayerEvent::Revealed { generation, .. } | PlayerEvent::Completed { generation, .. } => {
                *generation
            }
        }
    }
}

type Reply = oneshot::Sender<PlaybackState>;

#[derive(Debug)]
enum PlayerCommand {
    Load {
        snapshots: Vec<SearchSnapshot>,
        reply: Reply,
    },
    Start {
        snapshots: Vec<SearchSnapshot>,
        delay: Duration,
        reply: Reply,
    },
    Pause { reply: Reply },
    Resume { reply: Reply },
    Restart { reply: Reply },
    Toggle { reply: Reply },
    Dispose,
}

fn validate_delay(delay: Duration) -> PlaybackResult<()> {
    if delay.is_zero() {
        Err(PlaybackError::InvalidDelay)
    } else {
        Ok(())
    }
}

/// Handle to control one player task.
///
/// Dropping the handle aborts the task, which cancels its timer.
#[derive(Debug)]
pub struct StepPlayer {
    cmd_tx: mpsc::UnboundedSender<PlayerCommand>,
    state_rx: watch::Receiver<PlaybackState>,
    task: Option<JoinHandle<()>>,
}

impl StepPlayer {
    /// Spawn the player on the current tokio runtime.
    ///
    /// `delay` is the cadence used by `toggle` when starting a loaded
    /// sequence; `start` may override it.
    pub fn spawn(delay: Duration) -> PlaybackResult<(Self, mpsc::UnboundedReceiver<PlayerEvent>)> {
        validate_delay(delay)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| PlaybackError::NoRuntime)?;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PlaybackState::default());

        let task = PlayerTask {
            machine: PlaybackMachine::new(),
            snapshots: Vec::new(),
            delay,
            timer: None,
            cmd_rx,
            event_tx,
            state_tx,
        };
        let handle = runtime.spawn(task.run());

        Ok((
            Self {
                cmd_tx,
                state_rx,
                task: Some(handle),
            },
            event_rx,
        ))
    }

    /// Replace the sequence and rewind to its start without playing.
    pub async fn load(&self, snapshots: Vec<SearchSnapshot>) -> PlaybackResult<PlaybackState> {
        self.request(|reply| PlayerCommand::Load { snapshots, reply }).await
    }

    /// Play `snapshots` from the first one, one step every `delay`.
    pub async fn start(
        &self,
        snapshots: Vec<SearchSnapshot>,
        delay: Duration,
    ) -> PlaybackResult<PlaybackState> {
        validate_delay(delay)?;
        self.request(|reply| PlayerCommand::Start {
            snapshots,
            delay,
            reply,
        })
        .await
    }

    pub async fn pause(&self) -> PlaybackResult<PlaybackState> {
        self.request(|reply| PlayerCommand::Pause { reply }).await
    }

    pub async fn resume(&self) -> PlaybackResult<PlaybackState> {
        self.request(|reply| PlayerCommand::Resume { reply }).await
    }

    pub async fn restart(&self) -> PlaybackResult<PlaybackState> {
        self.request(|reply| PlayerCommand::Restart { reply }).await
    }

    pub async fn toggle(&self) -> PlaybackResult<PlaybackState> {
        self.request(|reply| PlayerCommand::Toggle { reply }).await
    }

    /// Last state published by the player task.
    pub fn state(&self) -> PlaybackState {
        *self.state_rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state_rx.clone()
    }

    /// Stop the task and wait until it has released its timer.
    pub async fn dispose(mut self) -> PlaybackResult<()> {
        let _ = self.cmd_tx.send(PlayerCommand::Dispose);
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| PlaybackError::TaskFailed(e.to_string()))?;
        }
        Ok(())
    }

    async fn request(&self, build: impl FnOnce(Reply) -> PlayerCommand) -> PlaybackResult<PlaybackState> {
        let (reply, response) = oneshot::channel();
        self.cmd_tx
            .send(build(reply))
            .map_err(|_| PlaybackError::Disposed)?;
        response.await.map_err(|_| PlaybackError::Disposed)
    }
}

impl Drop for StepPlayer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct PlayerTask {
    machine: PlaybackMachine,
    snapshots: Vec<SearchSnapshot>,
    delay: Duration,
    /// The only timer of this player
    timer: Option<Interval>,
    cmd_rx: mpsc::UnboundedReceiver<PlayerCommand>,
    event_tx: mpsc::UnboundedSender<PlayerEvent>,
    state_tx: watch::Sender<PlaybackState>,
}

impl PlayerTask {
    async fn run(mut self) {
        loop {
            tokio::select! {
                // Commands win over a tick that is ready at the same time
                biased;

                cmd = self.cmd_rx.recv() => match cmd {
                    Some(PlayerCommand::Dispose) | None => break,
                    Some(cmd) => self.handle(cmd),
                },
                _ = next_tick(&mut self.timer) => {
                    let transition = self.machine.tick();
                    self.apply(transition);
                }
            }
        }
        self.cancel_timer();
        debug!("step player stopped");
    }

    #[instrument(level = "debug", skip(self), fields(index = self.machine.current_index()))]
    fn handle(&mut self, cmd: PlayerCommand) {
        let (transition, reply) = match cmd {
            PlayerCommand::Load { snapshots, reply } => {
                self.snapshots = snapshots;
                (self.machine.load(self.snapshots.len()), reply)
            }
            PlayerCommand::Start {
                snapshots,
                delay,
                reply,
            } => {
                self.snapshots = snapshots;
                self.delay = delay;
                (self.machine.start(self.snapshots.len()), reply)
            }
            PlayerCommand::Pause { reply } => (self.machine.pause(), reply),
            PlayerCommand::Resume { reply } => (self.machine.resume(), reply),
            PlayerCommand::Restart { reply } => (self.machine.restart(), reply),
            PlayerCommand::Toggle { reply } => (self.machine.toggle(), reply),
            PlayerCommand::Dispose => return,
        };
        self.apply(transition);
        let _ = reply.send(self.machine.state());
    }

    fn apply(&mut self, transition: Transition) {
        match transition.timer {
            TimerDirective::Keep => {}
            TimerDirective::Arm => self.arm_timer(),
            TimerDirective::Cancel => self.cancel_timer(),
        }
        if let Some(index) = transition.reveal {
            if let Some(snapshot) = self.snapshots.get(index) {
                trace!(index, message = %snapshot.message, "revealing snapshot");
                let _ = self.event_tx.send(PlayerEvent::Revealed {
                    generation: self.machine.generation(),
                    index,
                    snapshot: snapshot.clone(),
                });
            }
        }
        if transition.completed {
            let _ = self.event_tx.send(PlayerEvent::Completed {
                generation: self.machine.generation(),
                last_index: self.machine.current_index(),
            });
        }
        self.state_tx.send_replace(self.machine.state());
    }

    /// Replaces any running timer; the first tick fires one delay from now.
    fn arm_timer(&mut self) {
        self.cancel_timer();
        let mut interval = time::interval_at(Instant::now() + self.delay, self.delay);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(interval);
        trace!(delay_ms = self.delay.as_millis() as u64, "timer armed");
    }

    fn cancel_timer(&mut self) {
        if self.timer.take().is_some() {
            trace!("timer cancelled");
        }
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
