//! Peg harness shared by the integration tests.
//!
//! Wires a [`PegFixture`] parent chain to a validator and reorg coordinator
//! over any claim store, and builds sidechain blocks on a linear chain.

use std::sync::Arc;

use bitcoin::Amount;
use fedpeg_db_types::{ClaimDatabase, MemClaimDb};
use fedpeg_pegin::{PeginValidator, ReorgCoordinator};
use fedpeg_primitives::{ClaimKey, ClaimState, SidechainBlock, SidechainBlockId, SidechainTx};
use fedpeg_test_utils::{federation::claim_script, Deposit, PegFixture};

/// Value of every deposit made through [`PegHarness::deposit`].
pub const DEPOSIT_VALUE: Amount = Amount::from_sat(100_000_000);

#[derive(Debug)]
pub struct PegHarness<D> {
    pub fx: PegFixture,
    pub coordinator: ReorgCoordinator<D>,
    next_nonce: u64,
}

impl PegHarness<MemClaimDb> {
    pub fn in_memory() -> Self {
        Self::new(PegFixture::default(), MemClaimDb::new())
    }
}

impl<D: ClaimDatabase> PegHarness<D> {
    pub fn new(fx: PegFixture, db: D) -> Self {
        let validator =
            PeginValidator::new(fx.params.clone(), db).expect("fixture params are valid");
        Self {
            fx,
            coordinator: ReorgCoordinator::new(Arc::new(validator)),
            next_nonce: 1,
        }
    }

    pub fn validator(&self) -> &PeginValidator<D> {
        self.coordinator.validator()
    }

    /// Mines a deposit to `claim_script(seed)` and buries it `confs` deep.
    pub fn deposit(&mut self, seed: u8, confs: u64) -> Deposit {
        let d = self.fx.deposit(&claim_script(seed), DEPOSIT_VALUE, seed);
        self.fx.confirm_to(&d, confs);
        d
    }

    /// A block on top of the sidechain genesis. Each call yields a distinct id.
    pub fn block(&mut self, txs: Vec<SidechainTx>) -> SidechainBlock {
        let nonce = self.next_nonce;
        self.next_nonce += 1;
        SidechainBlock::new(sidechain_genesis(), txs, nonce)
    }

    pub fn state(&self, key: &ClaimKey) -> ClaimState {
        self.validator()
            .registry()
            .lookup(key)
            .expect("claim store readable")
    }
}

pub fn sidechain_genesis() -> SidechainBlockId {
    SidechainBlockId::from([0; 32])
}
