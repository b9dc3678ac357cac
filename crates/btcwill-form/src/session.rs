//! Session-only mirror of the will payload
//!
//! In session-only mode the will is never stored server-side: the payload lives
//! here for the duration of one session and is zeroized after the PDF has been
//! generated, on logout, and on drop.

use crate::payload::WillPayload;
use std::fmt;
use zeroize::Zeroize;

#[derive(Default)]
pub struct SessionWillData {
    payload: Option<WillPayload>,
}

impl SessionWillData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the mirrored payload, wiping any previous one
    pub fn store(&mut self, payload: WillPayload) -> &WillPayload {
        self.wipe();
        self.payload.insert(payload)
    }

    pub fn get(&self) -> Option<&WillPayload> {
        self.payload.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_none()
    }

    /// Zeroize and drop the mirrored payload
    pub fn wipe(&mut self) {
        if let Some(mut payload) = self.payload.take() {
            payload.zeroize();
            log::debug!("Session will data wiped");
        }
    }
}

impl Drop for SessionWillData {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl fmt::Debug for SessionWillData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionWillData")
            .field("stored", &self.payload.is_some())
            .finish()
    }
}
