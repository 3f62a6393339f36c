//! A parent chain that exists only in memory.

use std::collections::HashMap;

use bitcoin::{
    absolute::LockTime,
    block::{self, Header},
    hashes::Hash,
    script::Builder,
    transaction::Version,
    Amount, BlockHash, CompactTarget, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut,
    Txid, Witness,
};
use fedpeg_primitives::{DepositProof, ParentHeader};
use fedpeg_spv::{build_proof, compute_root, HeaderChain, ParentChainView};

/// Regtest-style difficulty; nothing checks proof of work anyway.
const FAKE_BITS: u32 = 0x207fffff;

/// Block subsidy used for filler coinbases.
const SUBSIDY: Amount = Amount::from_sat(50 * 100_000_000);

pub fn coinbase_tx(height: u64, outputs: Vec<TxOut>) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig: Builder::new().push_int(height as i64).into_script(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: outputs,
    }
}

/// A plain transaction spending a made-up outpoint picked by `seed`.
pub fn spend_tx(seed: u8, outputs: Vec<TxOut>) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::new(Txid::from_byte_array([seed; 32]), 0),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness: Witness::new(),
        }],
        output: outputs,
    }
}

/// Header chain plus the txids of every block mined, so proofs can be built.
#[derive(Debug)]
pub struct FakeParentChain {
    headers: HeaderChain,
    txids: HashMap<BlockHash, Vec<Txid>>,
    genesis: BlockHash,
    nonce: u32,
}

impl Default for FakeParentChain {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeParentChain {
    pub fn new() -> Self {
        let coinbase = coinbase_tx(0, vec![TxOut {
            value: SUBSIDY,
            script_pubkey: ScriptBuf::new(),
        }]);
        let ids = vec![coinbase.compute_txid()];
        let header = make_header(BlockHash::all_zeros(), &ids, 0, 0);
        let genesis = header.block_hash();

        Self {
            headers: HeaderChain::new(ParentHeader::from_block_header(&header, 0), 10_000),
            txids: HashMap::from([(genesis, ids)]),
            genesis,
            nonce: 1,
        }
    }

    pub fn genesis_hash(&self) -> BlockHash {
        self.genesis
    }

    pub fn tip(&self) -> ParentHeader {
        *self.headers.tip()
    }

    pub fn headers(&self) -> &HeaderChain {
        &self.headers
    }

    /// Mines a block holding `txs`. A filler coinbase is put first unless
    /// `txs` already starts with one.
    pub fn mine_block(&mut self, txs: &[Transaction]) -> ParentHeader {
        let height = self.headers.tip_height() + 1;
        let mut ids = Vec::with_capacity(txs.len() + 1);
        if !txs.first().is_some_and(|t| t.is_coinbase()) {
            let filler = coinbase_tx(height, vec![TxOut {
                value: SUBSIDY,
                script_pubkey: ScriptBuf::new(),
            }]);
            ids.push(filler.compute_txid());
        }
        ids.extend(txs.iter().map(|t| t.compute_txid()));

        let header = make_header(self.headers.tip().hash(), &ids, height, self.nonce);
        self.nonce += 1;

        let entry = self
            .headers
            .connect(&header)
            .expect("fake chain always extends its tip");
        self.txids.insert(entry.hash(), ids);
        entry
    }

    pub fn mine_empty(&mut self, n: u64) {
        for _ in 0..n {
            self.mine_block(&[]);
        }
    }

    /// Drops blocks above `height`. Mining afterwards forks off.
    pub fn rewind_to(&mut self, height: u64) {
        self.headers
            .rewind_to(height)
            .expect("rewind within kept headers");
    }

    /// Inclusion proof for `txid` in the best-chain block containing it.
    pub fn proof_for(&self, txid: Txid) -> Option<DepositProof> {
        self.txids.iter().find_map(|(hash, ids)| {
            self.headers.get_header(hash)?;
            let index = ids.iter().position(|t| *t == txid)? as u32;
            let (siblings, _) = build_proof(ids, index)?;
            Some(DepositProof::new(*hash, siblings, index))
        })
    }
}

impl ParentChainView for FakeParentChain {
    fn get_header(&self, hash: &BlockHash) -> Option<ParentHeader> {
        self.headers.get_header(hash)
    }

    fn tip_height(&self) -> u64 {
        self.headers.tip_height()
    }
}

fn make_header(prev: BlockHash, txids: &[Txid], height: u64, nonce: u32) -> Header {
    Header {
        version: block::Version::TWO,
        prev_blockhash: prev,
        merkle_root: compute_root(txids).expect("block has a coinbase"),
        time: 1_600_000_000 + height as u32 * 600,
        bits: CompactTarget::from_consensus(FAKE_BITS),
        nonce,
    }
}
