//! Link-layer timers
//!
//! A fixed table of `NUM_TIMERS` callback slots fired on every system tick.
//! The table is assembled once at start-up from a [`TimerConfig`] and is
//! read-only afterwards, so the tick source can share it without locking.
//!
//! Slot 0 is reserved and never populated. The connection-timeout slot is
//! only populated when the full stack is configured.

mod clock;

pub use clock::{SystemTick, DEFAULT_TICK_MS};

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of callback slots
pub const NUM_TIMERS: usize = 4;

/// Slot holding the transport-layer connection timeout
pub const CONNECTION_TIMEOUT_TIMER: usize = 1;

/// Reserved "no callback" slot
const RESERVED_TIMER: usize = 0;

/// Zero-argument callback fired on a tick.
///
/// Runs on the tick thread: it must not block or perform I/O.
pub type TimerCallback = fn();

/// Which protocol layers are built on top of the link layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackType {
    /// Full stack, transport-layer connections included
    #[default]
    Full,
    /// Reduced stack without connection-oriented transport
    Reduced,
}

/// Errors raised while wiring the timer table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Slot 0 never holds a callback
    #[error("Timer slot 0 is reserved")]
    ReservedSlot,

    /// Index is not below `NUM_TIMERS`
    #[error("Timer slot {0} is out of range")]
    SlotOutOfRange(usize),
}

/// Slot assignment used to build a [`TimerTable`]
#[derive(Clone, Copy, Default)]
pub struct TimerConfig {
    slots: [Option<TimerCallback>; NUM_TIMERS],
}

impl TimerConfig {
    /// A table with every slot empty
    pub fn empty() -> Self {
        Self::default()
    }

    /// Standard assignment for `stack`
    pub fn for_stack(stack: StackType, on_connection_timeout: TimerCallback) -> Self {
        let mut slots = [None; NUM_TIMERS];
        if stack == StackType::Full {
            slots[CONNECTION_TIMEOUT_TIMER] = Some(on_connection_timeout);
        }
        Self { slots }
    }

    /// Put `callback` into slot `index`
    pub fn with_slot(mut self, index: usize, callback: TimerCallback) -> Result<Self, TimerError> {
        if index == RESERVED_TIMER {
            return Err(TimerError::ReservedSlot);
        }
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(TimerError::SlotOutOfRange(index))?;
        *slot = Some(callback);
        Ok(self)
    }

    /// True if slot `index` holds a callback
    pub fn is_populated(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }
}

impl std::fmt::Debug for TimerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let populated: Vec<usize> = (0..NUM_TIMERS).filter(|&i| self.is_populated(i)).collect();
        f.debug_struct("TimerConfig")
            .field("populated", &populated)
            .finish()
    }
}

/// Frozen callback table driven by [`TimerTable::tick`]
#[derive(Debug)]
pub struct TimerTable {
    config: TimerConfig,
    ticks: AtomicU64,
}

impl TimerTable {
    /// Freeze `config` into a table with a zero tick count
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            ticks: AtomicU64::new(0),
        }
    }

    /// Fire every populated slot once, in slot order
    pub fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        for callback in self.config.slots.iter().flatten() {
            callback();
        }
    }

    /// Number of ticks delivered so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// True if slot `index` holds a callback
    pub fn is_populated(&self, index: usize) -> bool {
        self.config.is_populated(index)
    }
}
