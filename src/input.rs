//! Gesture input
//!
//! Screen gestures are projected into world space and forwarded to the
//! level. Gestures produced on another thread travel through a bounded
//! channel and are applied between simulation steps.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::MAX_GESTURES_PER_FRAME;
use crate::error::GestureError;
use crate::sim::Level;

/// Maps screen coordinates onto the board's world plane
pub trait ScreenProjection {
    fn to_world(&self, screen: Vec2) -> Vec2;
    fn delta_to_world(&self, delta: Vec2) -> Vec2;
}

/// Orthographic camera looking straight down at the board
///
/// Screen origin is the top-left corner with y growing downwards; world
/// origin is the center of the view with y growing upwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrthoProjection {
    pub screen_width: f32,
    pub screen_height: f32,
    pub world_width: f32,
    pub world_height: f32,
}

impl OrthoProjection {
    pub fn new(screen_width: f32, screen_height: f32, world_width: f32, world_height: f32) -> Self {
        Self {
            screen_width,
            screen_height,
            world_width,
            world_height,
        }
    }

    fn scale(&self) -> Vec2 {
        Vec2::new(
            self.world_width / self.screen_width,
            -self.world_height / self.screen_height,
        )
    }

    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        Vec2::new(
            (world.x / self.world_width + 0.5) * self.screen_width,
            (0.5 - world.y / self.world_height) * self.screen_height,
        )
    }
}

impl ScreenProjection for OrthoProjection {
    fn to_world(&self, screen: Vec2) -> Vec2 {
        let centered = screen - Vec2::new(self.screen_width, self.screen_height) / 2.0;
        centered * self.scale()
    }

    fn delta_to_world(&self, delta: Vec2) -> Vec2 {
        delta * self.scale()
    }
}

/// A pointer or sensor event, screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Pointer moved by `delta` during a drag that began at `start`
    Drag { start: Vec2, delta: Vec2 },
    DragEnded { at: Vec2 },
    Tap { at: Vec2 },
    /// Device tilt vector
    Tilt(Vec3),
}

/// What the receiving side sees next
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Gesture(Gesture),
    /// The producer asked to stop; any backlog has been discarded
    Stop,
}

/// Producer side of the gesture channel
#[derive(Debug, Clone)]
pub struct GestureSender {
    tx: SyncSender<Gesture>,
    stop: Arc<AtomicBool>,
}

impl GestureSender {
    /// Queue a gesture, waiting while the queue is full
    pub fn send(&self, gesture: Gesture) -> Result<(), GestureError> {
        if self.stop.load(Ordering::Acquire) {
            return Err(GestureError::Closed);
        }
        self.tx.send(gesture).map_err(|_| GestureError::Closed)
    }

    pub fn try_send(&self, gesture: Gesture) -> Result<(), GestureError> {
        if self.stop.load(Ordering::Acquire) {
            return Err(GestureError::Closed);
        }
        self.tx.try_send(gesture).map_err(|e| match e {
            TrySendError::Full(_) => GestureError::Full,
            TrySendError::Disconnected(_) => GestureError::Closed,
        })
    }

    /// Ask the consumer to stop. Takes effect ahead of anything still queued.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }
}

/// Consumer side of the gesture channel
#[derive(Debug)]
pub struct GestureReceiver {
    rx: Receiver<Gesture>,
    stop: Arc<AtomicBool>,
}

impl GestureReceiver {
    /// Next message without blocking, `None` when the queue is empty
    pub fn try_next(&self) -> Option<Message> {
        if self.stop.load(Ordering::Acquire) {
            let dropped = self.rx.try_iter().count();
            if dropped > 0 {
                log::debug!("discarded {} queued gestures on stop", dropped);
            }
            return Some(Message::Stop);
        }
        match self.rx.try_recv() {
            Ok(gesture) => Some(Message::Gesture(gesture)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Message::Stop),
        }
    }
}

/// Bounded FIFO gesture channel with a stop signal
pub fn gesture_channel(capacity: usize) -> (GestureSender, GestureReceiver) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    let stop = Arc::new(AtomicBool::new(false));
    (
        GestureSender {
            tx,
            stop: Arc::clone(&stop),
        },
        GestureReceiver { rx, stop },
    )
}

/// Result of draining the gesture queue for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PumpOutcome {
    pub redraw: bool,
    pub stopped: bool,
    pub processed: usize,
}

/// Forwards gestures to a level, converting screen to world coordinates
#[derive(Debug, Clone)]
pub struct InteractionController<P> {
    projection: P,
}

impl<P: ScreenProjection> InteractionController<P> {
    pub fn new(projection: P) -> Self {
        Self { projection }
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    pub fn set_projection(&mut self, projection: P) {
        self.projection = projection;
    }

    pub fn drag(&self, level: &mut Level, start: Vec2, delta: Vec2) -> bool {
        level.drag(
            self.projection.to_world(start),
            self.projection.delta_to_world(delta),
        )
    }

    pub fn drag_ended(&self, level: &mut Level, at: Vec2) -> bool {
        level.drag_ended(self.projection.to_world(at))
    }

    pub fn tap(&self, level: &mut Level, at: Vec2) -> bool {
        level.tap(self.projection.to_world(at))
    }

    /// Apply one gesture, returning whether a redraw is needed
    pub fn apply(&self, level: &mut Level, gesture: Gesture) -> bool {
        match gesture {
            Gesture::Drag { start, delta } => self.drag(level, start, delta),
            Gesture::DragEnded { at } => self.drag_ended(level, at),
            Gesture::Tap { at } => self.tap(level, at),
            Gesture::Tilt(v) => {
                level.update_acceleration(v.x, v.y, v.z);
                false
            }
        }
    }

    /// Apply queued gestures, at most `MAX_GESTURES_PER_FRAME` of them
    pub fn pump(&self, level: &mut Level, rx: &GestureReceiver) -> PumpOutcome {
        let mut outcome = PumpOutcome::default();
        while outcome.processed < MAX_GESTURES_PER_FRAME {
            match rx.try_next() {
                Some(Message::Gesture(gesture)) => {
                    outcome.redraw |= self.apply(level, gesture);
                    outcome.processed += 1;
                }
                Some(Message::Stop) => {
                    outcome.stopped = true;
                    break;
                }
                None => break,
            }
        }
        outcome
    }
}
