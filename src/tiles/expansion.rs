//! Delivery of expansion pyramids to collection items
//!
//! Expanding a collection item needs the manifest of its dense pyramid, which
//! arrives asynchronously. The item hands out an [`ExpansionRequest`]; whoever
//! fetches the manifest fulfils the request's ticket, and the item picks the
//! result up on its next [`poll`](crate::tiles::collection::CollectionItemSource::poll_expansion).
//! Tickets carry the generation they were issued for, so a manifest that lands
//! after the item was contracted is dropped rather than attached.

use crate::{tiles::dense::DenseSource, Result};
use async_trait::async_trait;
use crossbeam_channel::Sender;

#[derive(Debug)]
pub(crate) struct ExpansionDelivery {
    pub(crate) generation: u64,
    pub(crate) source: DenseSource,
}

/// One-shot handle for delivering an expansion pyramid
#[derive(Debug)]
pub struct ExpansionTicket {
    generation: u64,
    sender: Sender<ExpansionDelivery>,
}

impl ExpansionTicket {
    pub(crate) fn new(generation: u64, sender: Sender<ExpansionDelivery>) -> Self {
        Self { generation, sender }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Hands the fetched pyramid back to its item.
    ///
    /// Returns false when the item no longer exists.
    pub fn fulfill(self, source: DenseSource) -> bool {
        self.sender
            .send(ExpansionDelivery {
                generation: self.generation,
                source,
            })
            .is_ok()
    }
}

/// A pending request for the dense pyramid behind a collection item
#[derive(Debug)]
pub struct ExpansionRequest {
    pub url: String,
    pub ticket: ExpansionTicket,
}

impl ExpansionRequest {
    /// Fetches the manifest and delivers the parsed pyramid
    pub async fn resolve_with<F>(self, fetcher: &F) -> Result<()>
    where
        F: ManifestFetcher + ?Sized,
    {
        let source = fetcher.fetch_dense(&self.url).await?;
        if !self.ticket.fulfill(source) {
            log::debug!("expansion for {} arrived after its item was dropped", self.url);
        }
        Ok(())
    }
}

/// Loads and parses dense pyramid manifests
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    async fn fetch_dense(&self, url: &str) -> Result<DenseSource>;
}
