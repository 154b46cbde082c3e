#![forbid(unsafe_code)]

//! Frame coalescing for high-frequency canvas input.
//!
//! Browsers deliver pointer moves and wheel ticks far faster than a canvas
//! can usefully repaint. Processing each one would run hit-testing and a
//! re-render per event. [`FrameCoalescer`] keeps a single-slot buffer per
//! coalescable kind and lets the caller drain it once per animation frame:
//!
//! - **Pointer moves**: latest position wins.
//! - **Wheel ticks**: consecutive ticks in the same direction merge into one
//!   event whose `ticks` field counts them; the latest position is kept as
//!   the zoom anchor.
//!
//! Everything else (presses, releases, keys, resize, focus) passes through
//! immediately. Before handling a pass-through event the caller should
//! [`flush`](FrameCoalescer::flush) so a release is never processed ahead
//! of the move that preceded it.
//!
//! # Usage
//!
//! ```
//! use mindmap_core::event::{InputEvent, PointerEvent, PointerEventKind};
//! use mindmap_core::event_coalescer::FrameCoalescer;
//!
//! let mut coalescer = FrameCoalescer::new();
//! let mv = |x| InputEvent::Pointer(PointerEvent::new(PointerEventKind::Move, x, 0.0));
//!
//! assert!(coalescer.push(mv(1.0)).is_none());
//! assert!(coalescer.push(mv(2.0)).is_none());
//!
//! // One frame tick: only the latest move survives.
//! let frame = coalescer.flush();
//! assert_eq!(frame.len(), 1);
//! ```

use crate::event::{InputEvent, PointerEvent, WheelEvent};

/// Latest-only buffer for pointer moves and wheel ticks.
///
/// Not thread-safe; used from the single UI event loop. All operations are
/// O(1) and at most two events are ever pending.
#[derive(Debug, Clone, Default)]
pub struct FrameCoalescer {
    pending_move: Option<PointerEvent>,
    pending_wheel: Option<WheelEvent>,
    coalesced_moves: u64,
}

impl FrameCoalescer {
    /// Create an empty coalescer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an event.
    ///
    /// Returns `Some(event)` when the event should be handled right away, or
    /// `None` when it was buffered. A wheel tick in the opposite direction of
    /// the pending one returns the pending (older) wheel event and starts a
    /// new accumulation.
    pub fn push(&mut self, event: InputEvent) -> Option<InputEvent> {
        match event {
            InputEvent::Pointer(pointer) if pointer.is_move() => {
                if self.pending_move.replace(pointer).is_some() {
                    self.coalesced_moves += 1;
                }
                None
            }
            InputEvent::Wheel(wheel) => self.push_wheel(wheel),
            other => Some(other),
        }
    }

    fn push_wheel(&mut self, wheel: WheelEvent) -> Option<InputEvent> {
        match self.pending_wheel {
            Some(pending) if pending.is_zoom_out() == wheel.is_zoom_out() => {
                self.pending_wheel = Some(WheelEvent {
                    position: wheel.position,
                    delta_y: pending.delta_y + wheel.delta_y,
                    ticks: pending.ticks.saturating_add(wheel.ticks),
                    modifiers: wheel.modifiers,
                });
                None
            }
            Some(pending) => {
                self.pending_wheel = Some(wheel);
                Some(InputEvent::Wheel(pending))
            }
            None => {
                self.pending_wheel = Some(wheel);
                None
            }
        }
    }

    /// Drain pending events: wheel first (older), then the latest move.
    #[must_use]
    pub fn flush(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::with_capacity(2);
        if let Some(wheel) = self.pending_wheel.take() {
            events.push(InputEvent::Wheel(wheel));
        }
        if let Some(pointer) = self.pending_move.take() {
            events.push(InputEvent::Pointer(pointer));
        }
        events
    }

    /// Whether anything is waiting for the next frame.
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending_move.is_some() || self.pending_wheel.is_some()
    }

    /// Number of wheel ticks waiting, 0 if none.
    #[must_use]
    pub fn pending_wheel_ticks(&self) -> u32 {
        self.pending_wheel.map_or(0, |w| w.ticks)
    }

    /// Total moves dropped because a newer one replaced them.
    #[must_use]
    pub fn coalesced_moves(&self) -> u64 {
        self.coalesced_moves
    }

    /// Drop everything pending without delivering it.
    pub fn clear(&mut self) {
        self.pending_move = None;
        self.pending_wheel = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyCode, KeyEvent, MouseButton, PointerEventKind};
    use crate::geometry::Point;

    fn mv(x: f64, y: f64) -> InputEvent {
        InputEvent::Pointer(PointerEvent::new(PointerEventKind::Move, x, y))
    }

    fn wheel(x: f64, dy: f64) -> InputEvent {
        InputEvent::Wheel(WheelEvent::new(x, 0.0, dy))
    }

    #[test]
    fn moves_keep_latest_only() {
        let mut c = FrameCoalescer::new();
        for i in 0..10 {
            assert!(c.push(mv(f64::from(i), 0.0)).is_none());
        }
        assert!(c.has_pending());
        assert_eq!(c.coalesced_moves(), 9);
        let out = c.flush();
        assert_eq!(out.len(), 1);
        let InputEvent::Pointer(p) = &out[0] else {
            unreachable!("expected pointer event");
        };
        assert_eq!(p.position, Point::new(9.0, 0.0));
        assert!(!c.has_pending());
        assert!(c.flush().is_empty());
    }

    #[test]
    fn presses_pass_through() {
        let mut c = FrameCoalescer::new();
        let down = InputEvent::Pointer(PointerEvent::new(
            PointerEventKind::Down(MouseButton::Left),
            1.0,
            1.0,
        ));
        assert_eq!(c.push(down.clone()), Some(down));
        let key = InputEvent::Key(KeyEvent::new(KeyCode::Enter));
        assert_eq!(c.push(key.clone()), Some(key));
        assert!(!c.has_pending());
    }

    #[test]
    fn wheel_same_direction_accumulates() {
        let mut c = FrameCoalescer::new();
        assert!(c.push(wheel(1.0, 10.0)).is_none());
        assert!(c.push(wheel(2.0, 10.0)).is_none());
        assert!(c.push(wheel(3.0, 10.0)).is_none());
        assert_eq!(c.pending_wheel_ticks(), 3);
        let out = c.flush();
        let InputEvent::Wheel(w) = out[0] else {
            unreachable!("expected wheel event");
        };
        assert_eq!(w.ticks, 3);
        assert_eq!(w.delta_y, 30.0);
        assert_eq!(w.position, Point::new(3.0, 0.0));
    }

    #[test]
    fn wheel_direction_change_flushes_old() {
        let mut c = FrameCoalescer::new();
        c.push(wheel(0.0, 10.0));
        c.push(wheel(0.0, 10.0));
        let old = c.push(wheel(0.0, -5.0));
        let Some(InputEvent::Wheel(w)) = old else {
            unreachable!("expected flushed wheel");
        };
        assert_eq!(w.ticks, 2);
        assert!(w.is_zoom_out());
        assert_eq!(c.pending_wheel_ticks(), 1);
    }

    #[test]
    fn flush_orders_wheel_before_move() {
        let mut c = FrameCoalescer::new();
        c.push(mv(1.0, 1.0));
        c.push(wheel(0.0, 1.0));
        let out = c.flush();
        assert!(matches!(out[0], InputEvent::Wheel(_)));
        assert!(matches!(out[1], InputEvent::Pointer(_)));
    }

    #[test]
    fn clear_drops_pending() {
        let mut c = FrameCoalescer::new();
        c.push(mv(1.0, 1.0));
        c.push(wheel(0.0, 1.0));
        c.clear();
        assert!(c.flush().is_empty());
    }
}
