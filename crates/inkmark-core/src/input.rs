//! Raw pointer input routing.
//!
//! Turns mouse and touch events into single-pointer gesture events and
//! two-finger pinch events. Positions stay in device pixels here.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Default touch movement, in device pixels, before a touch becomes a drag.
pub const TOUCH_SLOP: f64 = 8.0;

/// Source device of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Pointer event type for unified mouse/touch handling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Pointer id; each finger has its own.
    #[serde(default)]
    pub id: u64,
    pub kind: PointerKind,
    pub phase: PointerPhase,
    /// Position in device pixels.
    pub position: Point,
}

impl PointerEvent {
    pub fn mouse(phase: PointerPhase, position: Point) -> Self {
        Self {
            id: 0,
            kind: PointerKind::Mouse,
            phase,
            position,
        }
    }

    pub fn touch(id: u64, phase: PointerPhase, position: Point) -> Self {
        Self {
            id,
            kind: PointerKind::Touch,
            phase,
            position,
        }
    }
}

/// Single-pointer event handed to the mark gesture reducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    Cancel,
}

/// Two-finger event handed to the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinchEvent {
    Begin(Point, Point),
    Update(Point, Point),
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoutedEvent {
    Gesture(GestureEvent),
    Pinch(PinchEvent),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tracking {
    Idle,
    /// A touch that has not yet moved past the slop.
    Pending { id: u64, start: Point, current: Point },
    /// A pointer whose events are forwarded to the gesture reducer.
    Active { id: u64 },
    Pinch { a: (u64, Point), b: (u64, Point) },
}

/// Routes raw pointer events by arity and intent.
///
/// Mouse events pass straight through. A touch is held back until it moves
/// past the slop; released earlier it becomes a tap at its start point. A
/// second finger turns a pending touch into a pinch, but is ignored once a
/// mark gesture is under way.
#[derive(Debug, Clone)]
pub struct InputRouter {
    slop: f64,
    tracking: Tracking,
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new(TOUCH_SLOP)
    }
}

impl InputRouter {
    pub fn new(slop: f64) -> Self {
        Self {
            slop,
            tracking: Tracking::Idle,
        }
    }

    /// Forget every tracked pointer.
    pub fn reset(&mut self) {
        self.tracking = Tracking::Idle;
    }

    pub fn is_pinching(&self) -> bool {
        matches!(self.tracking, Tracking::Pinch { .. })
    }

    /// Whether a pointer is currently forwarded to the gesture reducer.
    pub fn has_active_gesture(&self) -> bool {
        matches!(self.tracking, Tracking::Active { .. })
    }

    /// Process a pointer event.
    pub fn route(&mut self, event: PointerEvent) -> Vec<RoutedEvent> {
        match event.kind {
            PointerKind::Mouse => self.route_mouse(event),
            PointerKind::Touch => self.route_touch(event),
        }
    }

    fn route_mouse(&mut self, event: PointerEvent) -> Vec<RoutedEvent> {
        let position = event.position;
        match (event.phase, self.tracking) {
            (PointerPhase::Down, Tracking::Idle) => {
                self.tracking = Tracking::Active { id: event.id };
                vec![RoutedEvent::Gesture(GestureEvent::Down(position))]
            }
            (PointerPhase::Move, Tracking::Active { id }) if id == event.id => {
                vec![RoutedEvent::Gesture(GestureEvent::Move(position))]
            }
            (PointerPhase::Up, Tracking::Active { id }) if id == event.id => {
                self.tracking = Tracking::Idle;
                vec![RoutedEvent::Gesture(GestureEvent::Up(position))]
            }
            (PointerPhase::Cancel, Tracking::Active { id }) if id == event.id => {
                self.tracking = Tracking::Idle;
                vec![RoutedEvent::Gesture(GestureEvent::Cancel)]
            }
            _ => Vec::new(),
        }
    }

    fn route_touch(&mut self, event: PointerEvent) -> Vec<RoutedEvent> {
        let position = event.position;
        match (event.phase, self.tracking) {
            (PointerPhase::Down, Tracking::Idle) => {
                self.tracking = Tracking::Pending {
                    id: event.id,
                    start: position,
                    current: position,
                };
                Vec::new()
            }
            (PointerPhase::Down, Tracking::Pending { id, current, .. }) if id != event.id => {
                log::debug!("Second touch, starting pinch");
                self.tracking = Tracking::Pinch {
                    a: (id, current),
                    b: (event.id, position),
                };
                vec![RoutedEvent::Pinch(PinchEvent::Begin(current, position))]
            }
            (PointerPhase::Move, Tracking::Pending { id, start, .. }) if id == event.id => {
                if start.distance(position) > self.slop {
                    self.tracking = Tracking::Active { id };
                    vec![
                        RoutedEvent::Gesture(GestureEvent::Down(start)),
                        RoutedEvent::Gesture(GestureEvent::Move(position)),
                    ]
                } else {
                    self.tracking = Tracking::Pending {
                        id,
                        start,
                        current: position,
                    };
                    Vec::new()
                }
            }
            (PointerPhase::Up, Tracking::Pending { id, start, .. }) if id == event.id => {
                self.tracking = Tracking::Idle;
                vec![
                    RoutedEvent::Gesture(GestureEvent::Down(start)),
                    RoutedEvent::Gesture(GestureEvent::Up(start)),
                ]
            }
            (PointerPhase::Cancel, Tracking::Pending { id, .. }) if id == event.id => {
                self.tracking = Tracking::Idle;
                Vec::new()
            }
            (PointerPhase::Move, Tracking::Active { id }) if id == event.id => {
                vec![RoutedEvent::Gesture(GestureEvent::Move(position))]
            }
            (PointerPhase::Up, Tracking::Active { id }) if id == event.id => {
                self.tracking = Tracking::Idle;
                vec![RoutedEvent::Gesture(GestureEvent::Up(position))]
            }
            (PointerPhase::Cancel, Tracking::Active { id }) if id == event.id => {
                self.tracking = Tracking::Idle;
                vec![RoutedEvent::Gesture(GestureEvent::Cancel)]
            }
            (PointerPhase::Move, Tracking::Pinch { a, b }) => {
                let (a, b) = if a.0 == event.id {
                    ((a.0, position), b)
                } else if b.0 == event.id {
                    (a, (b.0, position))
                } else {
                    return Vec::new();
                };
                self.tracking = Tracking::Pinch { a, b };
                vec![RoutedEvent::Pinch(PinchEvent::Update(a.1, b.1))]
            }
            (PointerPhase::Up | PointerPhase::Cancel, Tracking::Pinch { a, b })
                if a.0 == event.id || b.0 == event.id =>
            {
                self.tracking = Tracking::Idle;
                vec![RoutedEvent::Pinch(PinchEvent::End)]
            }
            _ => Vec::new(),
        }
    }
}
