// Pointer input as an ordered, bounded event list, consumed once per frame.
// The window is polled (position + button state), so `PointerTracker` turns
// successive polls into down/move/up/leave events.

use std::collections::VecDeque;

use crate::types::{PointerEvent, PointerKind};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    /// Pointer left the viewport.
    Leave,
}

impl InputEvent {
    fn is_move(&self) -> bool {
        matches!(self, InputEvent::Pointer(PointerEvent { kind: PointerKind::Move, .. }))
    }
}

/// FIFO with a hard capacity. When full, moves are dropped before anything
/// else: a missing move only straightens the stroke between its neighbours,
/// while a missing down/up would change what gets painted.
#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<InputEvent>,
    capacity: usize,
    dropped: u64,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self { events: VecDeque::with_capacity(capacity), capacity, dropped: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn push(&mut self, event: InputEvent) {
        if self.events.len() < self.capacity {
            self.events.push_back(event);
            return;
        }

        self.dropped += 1;
        if event.is_move() && self.events.back().is_some_and(InputEvent::is_move) {
            // Coalesce: the newer position replaces the trailing move.
            if let Some(back) = self.events.back_mut() {
                *back = event;
            }
            return;
        }
        match self.events.iter().position(InputEvent::is_move) {
            Some(i) => {
                self.events.remove(i);
            }
            None => {
                log::warn!("input queue full of non-move events, dropping oldest");
                self.events.pop_front();
            }
        }
        self.events.push_back(event);
    }

    /// Take everything queued, in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }
}

#[derive(Debug, Default)]
pub struct PointerTracker {
    last_pos: Option<(f32, f32)>,
    /// Last position seen inside the viewport; a release outside is reported here.
    last_inside: Option<(f32, f32)>,
    was_down: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare this poll with the previous one and queue the difference.
    /// `pos` is `None` while the pointer is outside the viewport.
    pub fn update(&mut self, pos: Option<(f32, f32)>, down: bool, timestamp: u64, queue: &mut EventQueue) {
        let event = |kind, (x, y): (f32, f32)| InputEvent::Pointer(PointerEvent::new(kind, x, y, timestamp));

        match pos {
            None => {
                if self.was_down && !down {
                    if let Some(last) = self.last_inside {
                        queue.push(event(PointerKind::Up, last));
                    }
                }
                if self.last_pos.is_some() {
                    queue.push(InputEvent::Leave);
                }
            }
            Some(p) => {
                if down && !self.was_down {
                    queue.push(event(PointerKind::Down, p));
                } else if !down && self.was_down {
                    queue.push(event(PointerKind::Up, p));
                } else if self.last_pos != Some(p) {
                    queue.push(event(PointerKind::Move, p));
                }
            }
        }
        self.last_pos = pos;
        if pos.is_some() {
            self.last_inside = pos;
        }
        self.was_down = down;
    }
}
