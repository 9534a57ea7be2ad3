//! Keyboard state fed from [`KeyEvent`]s.

use std::cell::RefCell;

use fb_event::KeyEvent;
use rustc_hash::FxHashSet;

pub const KEY_A: u32 = 65;
pub const KEY_D: u32 = 68;
pub const KEY_S: u32 = 83;
pub const KEY_W: u32 = 87;

/// Which keys are currently held.
#[derive(Debug, Default)]
pub struct Input {
    held: RefCell<FxHashSet<u32>>,
}

impl Input {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, event: &KeyEvent) {
        let mut held = self.held.borrow_mut();
        if event.is_down {
            held.insert(event.key_code);
        } else {
            held.remove(&event.key_code);
        }
    }

    #[must_use]
    pub fn is_key_down(&self, key_code: u32) -> bool {
        self.held.borrow().contains(&key_code)
    }

    /// Movement axis from WASD, each component in `-1..=1`.
    #[must_use]
    pub fn movement_axis(&self) -> (f32, f32) {
        let axis = |negative: u32, positive: u32| {
            if self.is_key_down(negative) {
                -1.0
            } else if self.is_key_down(positive) {
                1.0
            } else {
                0.0
            }
        };
        (axis(KEY_A, KEY_D), axis(KEY_S, KEY_W))
    }
}
