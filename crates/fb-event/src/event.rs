//! Event marker trait and the standard engine events.

/// Marker trait for event types.
///
/// Any `'static` type can be dispatched; events are matched by type.
pub trait Event: 'static {}

// Blanket implementation: any 'static type can be an event
impl<T: 'static> Event for T {}

/// Sent once per frame with the elapsed time in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameEvent {
    pub dt: f32,
}

/// A keyboard key changed state. Key codes are ASCII for letters and digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: u32,
    pub is_down: bool,
}

impl KeyEvent {
    #[must_use]
    pub const fn down(key_code: u32) -> Self {
        Self {
            key_code,
            is_down: true,
        }
    }

    #[must_use]
    pub const fn up(key_code: u32) -> Self {
        Self {
            key_code,
            is_down: false,
        }
    }
}
