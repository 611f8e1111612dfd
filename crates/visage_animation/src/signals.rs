//! External signals.
//!
//! The transport (WebSocket, IPC, ...) is outside the engine. It decodes
//! messages into [`Signal`]s and pushes them through a [`SignalSender`],
//! from any thread. The engine drains the queue at the start of each tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use visage_core::{Result, VisageError};

/// Normalised face position as reported by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacePosition {
    pub x: f32,
    pub y: f32,
}

/// One external signal.
///
/// Wire form: `{"type": "speak_start"}`, `{"type": "speak_stop"}`,
/// `{"type": "face_track", "data": {"x": 0.1, "y": -0.3}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Signal {
    SpeakStart,
    SpeakStop,
    FaceTrack(FacePosition),
}

impl Signal {
    #[must_use]
    pub fn face_track(x: f32, y: f32) -> Self {
        Signal::FaceTrack(FacePosition { x, y })
    }

    /// Decodes one wire message.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| VisageError::MalformedSignal {
            message: e.to_string(),
        })
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        // A fieldless enum and two floats always serialise.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Clamps face positions into `[-1, 1]`. Returns `None` for non-finite
    /// positions.
    #[must_use]
    pub fn sanitized(self) -> Option<Self> {
        match self {
            Signal::FaceTrack(p) if !(p.x.is_finite() && p.y.is_finite()) => {
                log::warn!("Dropping face_track with non-finite position ({}, {})", p.x, p.y);
                None
            }
            Signal::FaceTrack(p) => {
                if p.x.abs() > 1.0 || p.y.abs() > 1.0 {
                    log::warn!("Clamping face_track ({}, {}) into [-1, 1]", p.x, p.y);
                }
                let clamped = Vec2::new(p.x, p.y).clamp(Vec2::NEG_ONE, Vec2::ONE);
                Some(Signal::face_track(clamped.x, clamped.y))
            }
            other => Some(other),
        }
    }
}

/// Creates a connected sender/receiver pair.
#[must_use]
pub fn signal_channel() -> (SignalSender, SignalReceiver) {
    let (tx, rx) = flume::unbounded();
    (SignalSender { tx }, SignalReceiver { rx })
}

/// Cloneable, thread-safe producer side.
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: flume::Sender<Signal>,
}

impl SignalSender {
    /// Queues a signal. Returns `false` if the engine is gone.
    pub fn send(&self, signal: Signal) -> bool {
        self.tx.send(signal).is_ok()
    }

    /// Decodes and queues one wire message.
    pub fn send_json(&self, text: &str) -> Result<bool> {
        match Signal::from_json(text) {
            Ok(signal) => Ok(self.send(signal)),
            Err(err) => {
                log::warn!("Rejecting signal message: {err}");
                Err(err)
            }
        }
    }

    pub fn speak_start(&self) -> bool {
        self.send(Signal::SpeakStart)
    }

    pub fn speak_stop(&self) -> bool {
        self.send(Signal::SpeakStop)
    }

    pub fn face_track(&self, x: f32, y: f32) -> bool {
        self.send(Signal::face_track(x, y))
    }
}

/// Consumer side, owned by the engine.
#[derive(Debug)]
pub struct SignalReceiver {
    rx: flume::Receiver<Signal>,
}

impl SignalReceiver {
    /// Takes every signal queued so far without blocking.
    pub fn drain(&self) -> impl Iterator<Item = Signal> + '_ {
        self.rx.try_iter()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}
