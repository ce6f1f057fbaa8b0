//! Millisecond deadlines and the loop clock.
//!
//! Time is a count of milliseconds since boot. It is not strictly monotonic
//! (the loop clock is held still while the tile sleeps), so deadlines are only
//! ever compared with `<`/`>=`, never tested for equality.

/// Milliseconds since boot.
pub type Millis = u32;

/// Deadline that never expires.
pub const NEVER: Millis = Millis::MAX;

/// Source of the current time in milliseconds.
pub trait Clock {
    /// Returns the current time.
    fn millis(&self) -> Millis;
}

/// A deadline in milliseconds.
///
/// Timers come into this world pre-expired.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    expire_at: Millis,
}

impl Timer {
    /// Creates an already expired timer.
    pub const fn new() -> Self {
        Self { expire_at: 0 }
    }

    /// Returns `true` once `now` has reached the deadline.
    pub fn is_expired(&self, now: Millis) -> bool {
        self.expire_at != NEVER && now >= self.expire_at
    }

    /// Expires `ms` milliseconds after `now`. Saturates at [`NEVER`].
    pub fn set(&mut self, now: Millis, ms: u32) {
        self.expire_at = now.saturating_add(ms);
    }

    /// Expires immediately.
    pub fn expire(&mut self) {
        self.expire_at = 0;
    }

    /// Pushes the deadline back by `ms`, saturating at [`NEVER`].
    pub fn add(&mut self, ms: u32) {
        self.expire_at = self.expire_at.saturating_add(ms);
    }

    /// Never expires (until the next [`set`](Timer::set)).
    pub fn never(&mut self) {
        self.expire_at = NEVER;
    }

    /// Milliseconds left until the deadline, or 0 if already expired.
    pub fn remaining(&self, now: Millis) -> u32 {
        self.expire_at.saturating_sub(now)
    }
}

/// The time seen by the main loop.
///
/// The snapshot is taken once per loop iteration so that everything inside an
/// iteration sees the same `now`. Time spent asleep is subtracted out through
/// `offset`, so user timers do not appear to jump forward after a wake.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopClock {
    now: Millis,
    offset: Millis,
}

impl LoopClock {
    /// Creates a clock reading 0 with no offset.
    pub const fn new() -> Self {
        Self { now: 0, offset: 0 }
    }

    /// Takes a new snapshot from the raw clock.
    pub fn update(&mut self, raw: Millis) -> Millis {
        self.now = raw.wrapping_sub(self.offset);
        self.now
    }

    /// Snapshot taken by the last [`update`](LoopClock::update).
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Hides `ms` of raw time from every later snapshot.
    pub fn skip(&mut self, ms: u32) {
        self.offset = self.offset.wrapping_add(ms);
    }
}
