//! Page persistence.
//!
//! Saving is fire-and-forget from the editor's point of view: the last save
//! wins, and a failed save leaves the in-memory page untouched.

use pb_core::model::{DocumentError, PageDocument};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("could not encode page: {0}")]
    Encode(#[from] DocumentError),
    #[error("page store unavailable: {0}")]
    Unavailable(String),
}

/// Destination of saved pages.
pub trait PageStore {
    fn save(&mut self, page: &PageDocument) -> Result<(), SaveError>;

    /// The most recently saved page, if any.
    fn load(&self) -> Result<Option<PageDocument>, SaveError>;
}

/// In-memory store holding the MessagePack encoding of the last save.
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    encoded: Option<Vec<u8>>,
    saves: usize,
    offline: bool,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Size of the stored encoding in bytes.
    pub fn stored_len(&self) -> usize {
        self.encoded.as_ref().map_or(0, Vec::len)
    }
}

impl PageStore for MemoryPageStore {
    fn save(&mut self, page: &PageDocument) -> Result<(), SaveError> {
        if self.offline {
            return Err(SaveError::Unavailable("store is offline".to_string()));
        }
        self.encoded = Some(page.to_msgpack()?);
        self.saves += 1;
        Ok(())
    }

    fn load(&self) -> Result<Option<PageDocument>, SaveError> {
        self.encoded
            .as_deref()
            .map(PageDocument::from_msgpack)
            .transpose()
            .map_err(SaveError::from)
    }
}
