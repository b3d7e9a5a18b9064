//! Catalog sources and the background catalog loader.
//!
//! A [`CatalogSource`] stands for the device media index. Reading it may
//! block, so [`CatalogLoader`] runs it on the blocking pool and posts the
//! result back to the controller inbox tagged with a request sequence
//! number. Only the result of the newest request is current; a superseded
//! load that arrives late is discarded by the receiver.

use std::sync::Arc;

use {
    async_channel::Sender,
    tokio::{runtime::Handle, task::spawn_blocking},
    tracing::{debug, warn},
};

use crate::{
    error::CatalogError,
    library::models::{Catalog, CatalogEntry},
    state::ControllerMessage,
};

/// A finite listing of the audio files known to the device.
pub trait CatalogSource: Send + Sync {
    /// Lists every known audio entry.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the index cannot be read.
    fn fetch(&self) -> Result<Vec<CatalogEntry>, CatalogError>;
}

/// A catalog source over a fixed list of entries.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogSource {
    entries: Vec<CatalogEntry>,
}

impl StaticCatalogSource {
    /// Creates a source that always yields `entries`.
    #[must_use]
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }
}

impl CatalogSource for StaticCatalogSource {
    fn fetch(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(self.entries.clone())
    }
}

/// Issues sequence-numbered catalog loads.
pub struct CatalogLoader {
    /// Media index being read.
    source: Arc<dyn CatalogSource>,
    /// Controller inbox receiving `CatalogLoaded`.
    outbox: Sender<ControllerMessage>,
    /// Sequence number of the newest request (0 = none issued).
    latest: u64,
}

impl CatalogLoader {
    /// Creates a loader posting its results to `outbox`.
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>, outbox: Sender<ControllerMessage>) -> Self {
        Self {
            source,
            outbox,
            latest: 0,
        }
    }

    /// Starts a new load and returns its sequence number.
    ///
    /// Inside a tokio runtime the source is read on the blocking pool;
    /// otherwise it is read inline before this call returns. Either way the
    /// result arrives as a single `ControllerMessage::CatalogLoaded`.
    pub fn request(&mut self) -> u64 {
        self.latest += 1;
        let sequence = self.latest;
        let source = Arc::clone(&self.source);
        let outbox = self.outbox.clone();
        debug!(sequence, "CatalogLoader: requesting catalog");

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let result = match spawn_blocking(move || source.fetch()).await {
                        Ok(result) => result.map(Catalog::from_entries),
                        Err(e) => Err(CatalogError::TaskFailed(e.to_string())),
                    };
                    if let Err(e) = outbox
                        .send(ControllerMessage::CatalogLoaded { sequence, result })
                        .await
                    {
                        debug!("CatalogLoader: controller gone, dropping load {sequence}: {e}");
                    }
                });
            }
            Err(_) => {
                let result = source.fetch().map(Catalog::from_entries);
                if let Err(e) =
                    outbox.send_blocking(ControllerMessage::CatalogLoaded { sequence, result })
                {
                    warn!("CatalogLoader: failed to deliver load {sequence}: {e}");
                }
            }
        }

        sequence
    }

    /// Whether `sequence` belongs to the newest request.
    #[must_use]
    pub fn is_current(&self, sequence: u64) -> bool {
        sequence == self.latest
    }

    /// Sequence number of the newest request.
    #[must_use]
    pub fn latest(&self) -> u64 {
        self.latest
    }
}
