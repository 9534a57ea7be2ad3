#![allow(clippy::float_cmp)]

//! Firstblood event system
//!
//! A single-threaded dispatcher routing events to listeners by event type,
//! plus the standard engine events and a frame clock.
//!
//! # Example
//!
//! ```ignore
//! let dispatcher = EventDispatcher::new();
//! dispatcher.add_listener(move |frame: &FrameEvent| {
//!     registry.update(frame.dt).ok();
//! });
//!
//! let mut clock = FrameClock::new();
//! loop {
//!     dispatcher.dispatch(&clock.tick(Instant::now()));
//! }
//! ```

mod clock;
mod dispatcher;
mod event;

pub use clock::FrameClock;
pub use dispatcher::{EventDispatcher, ListenerId};
pub use event::{Event, FrameEvent, KeyEvent};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Event, EventDispatcher, FrameClock, FrameEvent, KeyEvent, ListenerId};
}
