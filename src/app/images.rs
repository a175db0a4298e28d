//! Image listing cache.
//!
//! The controller streams image entries one JSON object per message and ends
//! every stream with an empty message. Entries are either collected into a
//! single listing document or, while iterating, handed out one at a time.
//!
//! ```text
//!          /images              empty entry
//!  Idle ───────────▶ Fetching ─────────────▶ Full
//!   │ ▲
//!   │ │ served "done"
//!   │ └──────────────── IteratingFinished
//!   │ /nextImage                ▲
//!   └───────────▶ Iterating ────┘ empty entry
//! ```

use log::warn;
use serde_json::Value;

use super::payload_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCacheState {
    Idle,
    /// A full listing has been requested and entries are arriving.
    Fetching,
    /// The listing document is complete.
    Full,
    /// Entries are requested and served one by one.
    Iterating,
    /// The controller signalled the end of the iteration.
    IteratingFinished,
}

pub struct ImageCache {
    state: ImageCacheState,
    batch: Vec<String>,
    listing: String,
    /// One-slot hand-off for the iteration in progress.
    ready: Option<String>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self {
            state: ImageCacheState::Idle,
            batch: Vec::new(),
            listing: String::from("[]"),
            ready: None,
        }
    }

    pub fn state(&self) -> ImageCacheState {
        self.state
    }

    /// The most recently assembled listing, as a JSON array.
    pub fn listing(&self) -> &str {
        &self.listing
    }

    /// Feed one image message from the controller.
    pub fn on_image(&mut self, payload: &[u8]) {
        if payload.is_empty() {
            self.end_of_stream();
            return;
        }

        let Some(text) = payload_text(payload) else {
            warn!("images: entry is not UTF-8, dropped");
            return;
        };

        if self.state == ImageCacheState::Iterating {
            if self.ready.is_some() {
                warn!("images: previous entry not yet served, dropping new entry");
                return;
            }
            self.ready = Some(text.to_owned());
        } else {
            self.batch.push(text.to_owned());
        }
    }

    fn end_of_stream(&mut self) {
        if self.state == ImageCacheState::Iterating {
            self.state = ImageCacheState::IteratingFinished;
        } else {
            self.listing = assemble_listing(&self.batch);
            self.batch.clear();
            self.state = ImageCacheState::Full;
        }
    }

    pub(super) fn begin_fetch(&mut self) {
        self.state = ImageCacheState::Fetching;
    }

    pub(super) fn begin_iteration(&mut self) {
        self.ready = None;
        self.state = ImageCacheState::Iterating;
    }

    pub(super) fn finish_iteration(&mut self) {
        self.state = ImageCacheState::Idle;
    }

    pub fn has_ready(&self) -> bool {
        self.ready.is_some()
    }

    pub(super) fn take_ready(&mut self) -> Option<String> {
        self.ready.take()
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Join the entries into one JSON array, skipping entries that do not parse.
pub fn assemble_listing(entries: &[String]) -> String {
    let values: Vec<Value> = entries
        .iter()
        .filter_map(|e| match serde_json::from_str::<Value>(e) {
            Ok(v) => Some(v),
            Err(err) => {
                warn!("images: skipping malformed entry ({})", err);
                None
            }
        })
        .collect();
    serde_json::to_string(&values).unwrap_or_else(|_| String::from("[]"))
}
