//! Frame timer
//!
//! Animations register a callback that runs once per frame for as long as it
//! returns true. The timer is single-threaded: callbacks may register and
//! unregister (themselves or others) while a tick is running.

use crate::core::constants::DEFAULT_FRAME_DELAY_MS;
use fxhash::FxHashSet;
use instant::Instant;
use std::{cell::RefCell, fmt, rc::Rc, time::Duration};

/// Per-frame callback; receives the frame time in ms and returns whether to keep running
pub type FrameCallback = Box<dyn FnMut(f64) -> bool>;

/// Identifies a registration so it can be cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

struct Registration {
    token: TimerToken,
    callback: FrameCallback,
}

#[derive(Default)]
struct TimerState {
    registrations: Vec<Registration>,
    live: FxHashSet<TimerToken>,
    next_token: u64,
}

/// Shared handle to the frame timer; clones drive the same registrations
#[derive(Clone)]
pub struct FrameTimer {
    state: Rc<RefCell<TimerState>>,
    epoch: Instant,
    frame_delay: Duration,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::with_frame_delay(DEFAULT_FRAME_DELAY_MS)
    }

    /// Timer whose fallback interval is `frame_delay_ms`
    pub fn with_frame_delay(frame_delay_ms: u64) -> Self {
        Self {
            state: Rc::new(RefCell::new(TimerState::default())),
            epoch: Instant::now(),
            frame_delay: Duration::from_millis(frame_delay_ms),
        }
    }

    /// Interval between ticks when the host has no frame callback of its own
    pub fn frame_delay(&self) -> Duration {
        self.frame_delay
    }

    /// Milliseconds since the timer was created
    pub fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    pub fn register(&self, callback: impl FnMut(f64) -> bool + 'static) -> TimerToken {
        let mut state = self.state.borrow_mut();
        state.next_token += 1;
        let token = TimerToken(state.next_token);
        state.live.insert(token);
        state.registrations.push(Registration {
            token,
            callback: Box::new(callback),
        });
        token
    }

    /// Cancels a registration. Returns false if it had already ended.
    pub fn unregister(&self, token: TimerToken) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.live.remove(&token) {
            return false;
        }
        // a registration that is mid-tick is dropped when the tick finishes
        state.registrations.retain(|r| r.token != token);
        true
    }

    pub fn is_registered(&self, token: TimerToken) -> bool {
        self.state.borrow().live.contains(&token)
    }

    /// Whether anything wants ticks; hosts can stop scheduling frames when idle
    pub fn is_active(&self) -> bool {
        !self.state.borrow().live.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs every live callback once at `now`. Returns how many ran.
    pub fn tick(&self, now: f64) -> usize {
        let mut running = std::mem::take(&mut self.state.borrow_mut().registrations);
        let mut ran = 0;

        for registration in running.iter_mut() {
            if !self.is_registered(registration.token) {
                continue;
            }
            ran += 1;
            if !(registration.callback)(now) {
                self.state.borrow_mut().live.remove(&registration.token);
            }
        }

        let mut state = self.state.borrow_mut();
        let added = std::mem::take(&mut state.registrations);
        running.extend(added);
        running.retain(|r| state.live.contains(&r.token));
        state.registrations = running;
        ran
    }

    /// Ticks at the timer's own clock
    pub fn tick_now(&self) -> usize {
        self.tick(self.now())
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameTimer")
            .field("registrations", &self.len())
            .field("frame_delay", &self.frame_delay)
            .finish()
    }
}
