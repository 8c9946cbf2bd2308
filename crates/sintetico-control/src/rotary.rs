//! Rotary knob input: pointer drags to bounded values.
//!
//! A [`RotaryInputController`] is a two-state machine:
//!
//! ```text
//!            pointer_down (inside region)
//!   ┌──────┐ ─────────────────────────▶ ┌──────────┐
//!   │ Idle │                             │ Dragging │ ◀─┐ pointer_move
//!   └──────┘ ◀───────────────────────── └──────────┘ ──┘ (emits value)
//!            pointer_up / cancel / detach
//! ```
//!
//! Drags are tracked by angle around the knob's center rather than by
//! vertical distance. Each move measures the angle swept since pointer-down,
//! folds it into `(-180°, 180°]` so crossing the `atan2` seam at ±180° is not
//! read as a near-full turn, and offsets the anchor value's indicator angle
//! by it. The result goes through [`angle_to_value`], which saturates at the
//! ends of the 270° sweep.
//!
//! While a drag is active the control holds a [`ListenerGuard`] from the
//! shared [`ListenerRegistry`]: the global move/up subscription. Ending the
//! drag by any path drops the guard.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use sintetico_core::{angle_to_value, normalize_delta_degrees, pointer_angle, to_degrees, value_to_angle};

use crate::error::RotaryError;

/// Axis-aligned hit region in client coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Create a rect from its top-left corner and size.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Midpoint, the knob's center of rotation.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Whether the point lies inside (edges inclusive).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// Non-empty and finite, so a center can be derived.
    pub fn is_measurable(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }
}

/// Tracks which controls currently hold the global pointer move/up
/// subscription.
///
/// Cloning shares the registry.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    inner: Rc<RefCell<Listeners>>,
}

#[derive(Debug, Default)]
struct Listeners {
    next_id: u64,
    active: BTreeSet<u64>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a move/up listener pair. It stays registered until the
    /// returned guard is dropped.
    pub fn acquire(&self) -> ListenerGuard {
        let mut listeners = self.inner.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.active.insert(id);
        ListenerGuard {
            registry: Rc::clone(&self.inner),
            id,
        }
    }

    /// Number of listener pairs currently registered.
    pub fn active_count(&self) -> usize {
        self.inner.borrow().active.len()
    }
}

/// A registered global pointer move/up listener pair, removed on drop.
#[derive(Debug)]
pub struct ListenerGuard {
    registry: Rc<RefCell<Listeners>>,
    id: u64,
}

impl ListenerGuard {
    /// Registry-unique identifier of this registration.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.registry.borrow_mut().active.remove(&self.id);
    }
}

/// State captured at pointer-down for the length of one drag.
#[derive(Debug)]
pub struct DragSession {
    anchor_angle: f32,
    anchor_value: f32,
    center: (f32, f32),
    _listeners: ListenerGuard,
}

impl DragSession {
    /// Pointer angle around the center at pointer-down, in radians.
    pub fn anchor_angle_radians(&self) -> f32 {
        self.anchor_angle
    }

    /// Control value at pointer-down.
    pub fn anchor_value(&self) -> f32 {
        self.anchor_value
    }
}

/// Drag state of a rotary control.
#[derive(Debug, Default)]
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// A drag is in progress.
    Dragging(DragSession),
}

/// Converts pointer drags on a knob into values in `[min, max]`.
///
/// The value is externally owned: the controller writes it back with
/// [`set_value`](Self::set_value) after every change it accepts, and the
/// indicator [`angle`](Self::angle) is always derived from it.
///
/// # Example
///
/// ```rust
/// use sintetico_control::{ListenerRegistry, Rect, RotaryInputController};
///
/// let registry = ListenerRegistry::new();
/// let mut knob = RotaryInputController::new(20.0, 2000.0, 1010.0, registry.clone());
/// knob.attach(Rect::new(0.0, 0.0, 100.0, 100.0));
///
/// // Grab the knob straight above its center, then move a quarter turn clockwise.
/// knob.pointer_down(50.0, 0.0)?;
/// let value = knob.pointer_move(100.0, 50.0).expect("dragging");
/// assert!(value > 1010.0);
/// assert_eq!(registry.active_count(), 1);
///
/// knob.pointer_up();
/// assert_eq!(registry.active_count(), 0);
/// # Ok::<(), sintetico_control::RotaryError>(())
/// ```
#[derive(Debug)]
pub struct RotaryInputController {
    min: f32,
    max: f32,
    value: f32,
    geometry: Option<Rect>,
    drag: DragState,
    registry: ListenerRegistry,
}

impl RotaryInputController {
    /// Create an idle control over `[min, max]` holding `value`.
    ///
    /// `min` must be strictly less than `max`.
    pub fn new(min: f32, max: f32, value: f32, registry: ListenerRegistry) -> Self {
        debug_assert!(min < max, "rotary range must be non-empty: {min}..{max}");
        Self {
            min,
            max,
            value: value.clamp(min, max),
            geometry: None,
            drag: DragState::Idle,
            registry,
        }
    }

    /// Supply (or update) the hit region.
    pub fn attach(&mut self, rect: Rect) {
        self.geometry = Some(rect);
    }

    /// Remove the hit region, ending any drag.
    pub fn detach(&mut self) {
        self.geometry = None;
        self.end_drag();
    }

    /// Current hit region.
    pub fn geometry(&self) -> Option<Rect> {
        self.geometry
    }

    /// Lower bound.
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Current value.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Overwrite the value (clamped). Safe in any state; an active drag keeps
    /// its anchor.
    pub fn set_value(&mut self, value: f32) {
        if value.is_finite() {
            self.value = value.clamp(self.min, self.max);
        }
    }

    /// Indicator angle in degrees, derived from the current value.
    pub fn angle(&self) -> f32 {
        value_to_angle(self.value, self.min, self.max)
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging(_))
    }

    /// Current drag state.
    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    /// Begin a drag at client position `(x, y)`.
    ///
    /// Fails with [`RotaryError::GeometryUnavailable`] (and stays idle) when
    /// the control has no measurable hit region, and with
    /// [`RotaryError::OutsideHitRegion`] when `(x, y)` misses it. A drag
    /// already in progress is replaced.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Result<(), RotaryError> {
        let rect = self
            .geometry
            .filter(Rect::is_measurable)
            .ok_or(RotaryError::GeometryUnavailable)?;
        if !rect.contains(x, y) {
            return Err(RotaryError::OutsideHitRegion);
        }
        let center = rect.center();
        let anchor_angle = pointer_angle(x, y, center.0, center.1);

        // Release the old registration before taking a new one.
        self.drag = DragState::Idle;
        self.drag = DragState::Dragging(DragSession {
            anchor_angle,
            anchor_value: self.value,
            center,
            _listeners: self.registry.acquire(),
        });
        tracing::debug!(
            anchor_value = self.value,
            anchor_degrees = to_degrees(anchor_angle),
            "drag started"
        );
        Ok(())
    }

    /// Track the pointer at `(x, y)`. Returns the new value while dragging,
    /// `None` when idle or when the sample is not finite.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Option<f32> {
        let DragState::Dragging(session) = &self.drag else {
            return None;
        };
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        let current = pointer_angle(x, y, session.center.0, session.center.1);
        let delta = normalize_delta_degrees(to_degrees(current - session.anchor_angle));
        let angle = value_to_angle(session.anchor_value, self.min, self.max) + delta;
        let value = angle_to_value(angle, self.min, self.max);

        self.value = value;
        Some(value)
    }

    /// End the drag. The value is left where the last move put it.
    pub fn pointer_up(&mut self) {
        self.end_drag();
    }

    /// End any drag without a release event (teardown).
    pub fn cancel(&mut self) {
        self.end_drag();
    }

    fn end_drag(&mut self) {
        if let DragState::Dragging(_) = std::mem::take(&mut self.drag) {
            tracing::debug!(value = self.value, "drag ended");
        }
    }
}
