//! Pointer input shared between an input thread and the engine.

use std::sync::Arc;

use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::DOMAIN_HALF_EXTENT;

/// Snapshot of the pointer in domain space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerState {
    /// Cursor position in `[-1, 1]^2`.
    pub position: Vec2,
    /// Primary button held: particles are attracted to the cursor.
    pub primary: bool,
    /// Secondary button held: particles are pushed away from the cursor.
    pub secondary: bool,
}

/// Converts window pixel coordinates (origin top-left, y down) into domain space.
pub fn window_to_domain(x: f64, y: f64, width: u32, height: u32) -> Vec2 {
    let width = f64::from(width.max(1));
    let height = f64::from(height.max(1));
    let nx = (2.0 * x / width - 1.0) as f32;
    let ny = (1.0 - 2.0 * y / height) as f32;
    Vec2::new(nx, ny).clamp(
        Vec2::splat(-DOMAIN_HALF_EXTENT),
        Vec2::splat(DOMAIN_HALF_EXTENT),
    )
}

impl PointerState {
    pub fn is_active(&self) -> bool {
        self.primary || self.secondary
    }
}

/// Cloneable handle to the engine's pointer state.
///
/// Writers and the engine never coordinate beyond the lock: the engine reads
/// whatever was written last when a tick starts integrating.
#[derive(Debug, Default, Clone)]
pub struct InputHandle {
    state: Arc<RwLock<PointerState>>,
}

impl InputHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pointer(&self, position: Vec2) {
        let clamped = position.clamp(
            Vec2::splat(-DOMAIN_HALF_EXTENT),
            Vec2::splat(DOMAIN_HALF_EXTENT),
        );
        self.state.write().position = clamped;
    }

    /// Moves the pointer to a window pixel position.
    pub fn set_pointer_from_window(&self, x: f64, y: f64, width: u32, height: u32) {
        self.state.write().position = window_to_domain(x, y, width, height);
    }

    pub fn set_buttons(&self, primary: bool, secondary: bool) {
        let mut state = self.state.write();
        state.primary = primary;
        state.secondary = secondary;
    }

    pub fn update(&self, state: PointerState) {
        *self.state.write() = state;
    }

    pub fn snapshot(&self) -> PointerState {
        *self.state.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_coordinates_map_to_domain() {
        assert_eq!(window_to_domain(0.0, 0.0, 512, 512), Vec2::new(-1.0, 1.0));
        assert_eq!(window_to_domain(256.0, 256.0, 512, 512), Vec2::ZERO);
        assert_eq!(window_to_domain(1024.0, 600.0, 512, 512), Vec2::new(1.0, -1.0));

        let handle = InputHandle::new();
        handle.set_buttons(true, false);
        handle.set_pointer_from_window(384.0, 128.0, 512, 512);
        let state = handle.snapshot();
        assert_eq!(state.position, Vec2::new(0.5, 0.5));
        assert!(state.primary);
    }

    #[test]
    fn handle_clones_share_state() {
        let handle = InputHandle::new();
        let writer = handle.clone();
        writer.set_pointer(Vec2::new(3.0, 0.25));
        writer.set_buttons(true, false);

        let state = handle.snapshot();
        assert_eq!(state.position, Vec2::new(1.0, 0.25));
        assert!(state.primary);
        assert!(state.is_active());
    }
}
