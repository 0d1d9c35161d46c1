//! Circular layout of automaton states.
//!
//! State `i` of `n` sits at angle `2πi/n` on a circle of radius
//! `0.35 * min(width, height)` centred on the drawing surface. Pan and zoom
//! are applied by the renderer on top of these coordinates.

use crate::definition::State;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;

/// Fraction of the smaller surface dimension used as the layout radius.
pub const RADIUS_FACTOR: f64 = 0.35;

/// Drawing surface dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
}

impl Surface {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub fn radius(&self) -> f64 {
        self.width.min(self.height) * RADIUS_FACTOR
    }
}

/// Placement of one state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    /// Angle around the layout centre, in radians.
    pub angle: f64,
}

/// Computes positions for `states` on `surface`.
pub fn circle_layout(states: &[State], surface: Surface) -> HashMap<State, Position> {
    let n = states.len();
    if n == 0 {
        return HashMap::new();
    }

    let (cx, cy) = surface.center();
    let r = surface.radius();

    states
        .iter()
        .enumerate()
        .map(|(i, state)| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            let position = Position {
                x: cx + r * angle.cos(),
                y: cy + r * angle.sin(),
                angle,
            };
            (state.clone(), position)
        })
        .collect()
}

/// Caches a layout until the state set or the surface changes.
#[derive(Debug, Default)]
pub struct LayoutCache {
    states: Vec<State>,
    surface: Option<Surface>,
    positions: HashMap<State, Position>,
    recomputes: u64,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns positions for `states` on `surface`, recomputing only when
    /// either differs from the cached inputs.
    pub fn positions(&mut self, states: &[State], surface: Surface) -> &HashMap<State, Position> {
        if self.surface != Some(surface) || self.states.as_slice() != states {
            tracing::debug!(
                "Recomputing layout for {} states on {}x{}",
                states.len(),
                surface.width,
                surface.height
            );
            self.positions = circle_layout(states, surface);
            self.states = states.to_vec();
            self.surface = Some(surface);
            self.recomputes += 1;
        }
        &self.positions
    }

    /// Number of times the layout has been computed.
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states(names: &[&str]) -> Vec<State> {
        names.iter().map(|s| State::from(*s)).collect()
    }

    #[test]
    fn test_empty_layout() {
        assert!(circle_layout(&[], Surface::new(800.0, 600.0)).is_empty());
    }

    #[test]
    fn test_single_state_on_right() {
        let layout = circle_layout(&states(&["q0"]), Surface::new(800.0, 600.0));
        let p = layout[&State::from("q0")];

        assert_eq!(p.angle, 0.0);
        assert!((p.x - 610.0).abs() < 1e-9);
        assert!((p.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_angles_evenly_spaced() {
        let layout = circle_layout(&states(&["a", "b", "c", "d"]), Surface::new(100.0, 100.0));

        assert_eq!(layout[&State::from("a")].angle, 0.0);
        assert_eq!(layout[&State::from("b")].angle, PI / 2.0);
        assert_eq!(layout[&State::from("c")].angle, PI);
        assert!((layout[&State::from("b")].y - 85.0).abs() < 1e-9);
        assert!((layout[&State::from("c")].x - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let s = states(&["q0", "q1", "q2"]);
        let a = circle_layout(&s, Surface::new(640.0, 480.0));
        let b = circle_layout(&s, Surface::new(640.0, 480.0));

        for state in &s {
            assert_eq!(a[state].x.to_bits(), b[state].x.to_bits());
            assert_eq!(a[state].y.to_bits(), b[state].y.to_bits());
        }
    }

    #[test]
    fn test_resize_preserves_angles() {
        let s = states(&["q0", "q1", "q2"]);
        let small = circle_layout(&s, Surface::new(200.0, 100.0));
        let large = circle_layout(&s, Surface::new(1000.0, 900.0));

        for state in &s {
            assert_eq!(small[state].angle, large[state].angle);
        }
    }

    #[test]
    fn test_cache_reuses_layout() {
        let mut cache = LayoutCache::new();
        let s = states(&["q0", "q1"]);
        let surface = Surface::new(800.0, 600.0);

        let first = cache.positions(&s, surface).clone();
        let second = cache.positions(&s, surface).clone();
        assert_eq!(first, second);
        assert_eq!(cache.recomputes(), 1);

        cache.positions(&s, Surface::new(400.0, 300.0));
        assert_eq!(cache.recomputes(), 2);

        cache.positions(&states(&["q0", "q1", "q2"]), Surface::new(400.0, 300.0));
        assert_eq!(cache.recomputes(), 3);

        // a rename with the same count still recomputes
        cache.positions(&states(&["q0", "q1", "q3"]), Surface::new(400.0, 300.0));
        assert_eq!(cache.recomputes(), 4);
    }
}
