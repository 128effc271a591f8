//! QR scan session
//!
//! Tracks one scanner through `Idle -> CameraActive -> (Decoded | DecodeError)
//! -> Idle`. After every decode attempt, success or failure, frames are
//! ignored until the debounce interval has passed.

use std::time::Duration;

use chrono::Utc;
use futures::{Stream, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::QrConfig;
use crate::services::qr::{Frame, PayloadValidator, QrPayload};
use crate::utils::errors::Result;

/// Current state of a scan session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    CameraActive,
    Decoded(QrPayload),
    DecodeError(String),
}

#[derive(Debug, Clone)]
pub struct ScanSession {
    state: ScanState,
    debounce: Duration,
    validator: PayloadValidator,
    paused_until: Option<Instant>,
}

impl ScanSession {
    pub fn new(debounce: Duration, validator: PayloadValidator) -> Self {
        Self {
            state: ScanState::Idle,
            debounce,
            validator,
            paused_until: None,
        }
    }

    pub fn from_config(config: &QrConfig) -> Self {
        Self::new(config.debounce(), PayloadValidator::from_config(config))
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Turn the camera on; ignored unless idle
    pub fn start(&mut self) {
        if self.state == ScanState::Idle {
            debug!("Scanner camera active");
            self.state = ScanState::CameraActive;
        }
    }

    pub fn stop(&mut self) {
        self.state = ScanState::Idle;
        self.paused_until = None;
    }

    pub fn is_paused(&self, now: Instant) -> bool {
        self.paused_until.map_or(false, |until| now < until)
    }

    /// Leave a decode result once its debounce has elapsed
    pub fn poll(&mut self, now: Instant) -> &ScanState {
        let settled = matches!(self.state, ScanState::Decoded(_) | ScanState::DecodeError(_));
        if settled && !self.is_paused(now) {
            self.state = ScanState::Idle;
            self.paused_until = None;
        }
        &self.state
    }

    /// Offer decoded text; `None` when the session is not accepting input
    pub fn offer_text(&mut self, text: &str, now: Instant) -> Option<Result<QrPayload>> {
        self.poll(now);
        if self.state != ScanState::CameraActive {
            return None;
        }
        let result = self.validator.validate(text, Utc::now());
        self.settle(&result, now);
        Some(result)
    }

    /// Offer a camera frame. Frames without a symbol are not decode attempts.
    pub fn offer_frame(&mut self, frame: &Frame, now: Instant) -> Option<Result<QrPayload>> {
        self.poll(now);
        if self.state != ScanState::CameraActive {
            return None;
        }
        match frame.detect() {
            Ok(None) => None,
            Ok(Some(text)) => self.offer_text(&text, now),
            Err(e) => {
                let result = Err(e);
                self.settle(&result, now);
                Some(result)
            }
        }
    }

    fn settle(&mut self, result: &Result<QrPayload>, now: Instant) {
        self.paused_until = Some(now + self.debounce);
        self.state = match result {
            Ok(payload) => {
                info!(event_id = payload.event_id, "QR code decoded");
                ScanState::Decoded(payload.clone())
            }
            Err(e) => {
                debug!(error = %e, "QR decode attempt failed");
                ScanState::DecodeError(e.user_message())
            }
        };
    }

    /// Pull frames until the next decode attempt, restarting the camera after
    /// each debounce. Returns `None` when the stream ends first.
    pub async fn next_attempt<S>(&mut self, frames: &mut S) -> Option<Result<QrPayload>>
    where
        S: Stream<Item = Frame> + Unpin,
    {
        self.start();
        while let Some(frame) = frames.next().await {
            let now = Instant::now();
            if *self.poll(now) == ScanState::Idle {
                self.start();
            }
            if let Some(result) = self.offer_frame(&frame, now) {
                return Some(result);
            }
        }
        None
    }
}
