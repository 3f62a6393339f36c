//! Read access to parent-chain headers, and a bounded in-memory index.

use std::collections::{HashMap, VecDeque};

use bitcoin::{block::Header, BlockHash};
use fedpeg_primitives::ParentHeader;
use tracing::*;

use crate::errors::HeaderChainError;

/// What the engine needs from whatever follows the parent chain.
pub trait ParentChainView {
    /// Header with the given hash, if it is on the view's best chain.
    fn get_header(&self, hash: &BlockHash) -> Option<ParentHeader>;

    /// Height of the current best tip.
    fn tip_height(&self) -> u64;
}

impl<T: ParentChainView + ?Sized> ParentChainView for &T {
    fn get_header(&self, hash: &BlockHash) -> Option<ParentHeader> {
        (**self).get_header(hash)
    }

    fn tip_height(&self) -> u64 {
        (**self).tip_height()
    }
}

/// Best-chain headers from some anchor up to the tip, keeping at most
/// `max_headers` of them. Headers are linked by hash only; proof of work is
/// the header source's problem.
#[derive(Clone, Debug)]
pub struct HeaderChain {
    headers: VecDeque<ParentHeader>,
    by_hash: HashMap<BlockHash, u64>,
    max_headers: usize,
}

impl HeaderChain {
    /// Starts a chain at `anchor`, usually the parent genesis or a checkpoint.
    pub fn new(anchor: ParentHeader, max_headers: usize) -> Self {
        let mut by_hash = HashMap::new();
        by_hash.insert(anchor.hash(), anchor.height());
        Self {
            headers: VecDeque::from([anchor]),
            by_hash,
            max_headers: max_headers.max(1),
        }
    }

    pub fn tip(&self) -> &ParentHeader {
        // Never empty: pruning and rewinding both keep at least one header.
        &self.headers[self.headers.len() - 1]
    }

    pub fn oldest(&self) -> &ParentHeader {
        &self.headers[0]
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn header_at(&self, height: u64) -> Option<&ParentHeader> {
        let idx = height.checked_sub(self.oldest().height())?;
        self.headers.get(idx as usize)
    }

    /// Appends a header on top of the tip.
    pub fn connect(&mut self, header: &Header) -> Result<ParentHeader, HeaderChainError> {
        let tip = *self.tip();
        if header.prev_blockhash != tip.hash() {
            return Err(HeaderChainError::ContinuityError {
                expected: tip.hash(),
                found: header.prev_blockhash,
            });
        }

        let entry = ParentHeader::from_block_header(header, tip.height() + 1);
        self.by_hash.insert(entry.hash(), entry.height());
        self.headers.push_back(entry);

        while self.headers.len() > self.max_headers {
            if let Some(old) = self.headers.pop_front() {
                self.by_hash.remove(&old.hash());
            }
        }

        trace!(height = entry.height(), hash = %entry.hash(), "connected parent header");
        Ok(entry)
    }

    /// Drops every header above `height`, making the header at `height` the tip.
    pub fn rewind_to(&mut self, height: u64) -> Result<(), HeaderChainError> {
        let oldest = self.oldest().height();
        if height < oldest {
            return Err(HeaderChainError::RewindTooDeep {
                target: height,
                oldest,
            });
        }

        while self.tip().height() > height {
            if let Some(h) = self.headers.pop_back() {
                self.by_hash.remove(&h.hash());
            }
        }

        debug!(%height, "rewound parent header chain");
        Ok(())
    }
}

impl ParentChainView for HeaderChain {
    fn get_header(&self, hash: &BlockHash) -> Option<ParentHeader> {
        let height = *self.by_hash.get(hash)?;
        self.header_at(height).copied()
    }

    fn tip_height(&self) -> u64 {
        self.tip().height()
    }
}
