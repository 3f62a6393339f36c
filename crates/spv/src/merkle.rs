//! Bitcoin transaction merkle trees.
//!
//! Nodes are `sha256d(left || right)` over internal-order hashes, and a level
//! with an odd number of nodes pairs its last node with itself.

use bitcoin::{
    hashes::{sha256d, Hash},
    TxMerkleNode, Txid,
};
use fedpeg_primitives::{Buf32, DepositProof, DepositTransaction, ParentHeader, MAX_PROOF_DEPTH};
use tracing::*;

use crate::errors::ProofError;

fn hash_pair(left: &Buf32, right: &Buf32) -> Buf32 {
    let mut combined = [0u8; 64];
    combined[..32].copy_from_slice(left.as_bytes());
    combined[32..].copy_from_slice(right.as_bytes());
    Buf32::from(sha256d::Hash::hash(&combined).to_byte_array())
}

/// Builds the sibling path for the transaction at `index`, returning it with
/// the root. Returns `None` if `index` is out of range.
pub fn build_proof(txids: &[Txid], index: u32) -> Option<(Vec<Buf32>, Buf32)> {
    if index as usize >= txids.len() {
        return None;
    }

    let mut curr_level: Vec<Buf32> = txids
        .iter()
        .map(|t| Buf32::from(t.to_byte_array()))
        .collect();
    let mut curr_index = index as usize;
    let mut cohashes = Vec::new();

    while curr_level.len() > 1 {
        let mut next_level = Vec::with_capacity(curr_level.len().div_ceil(2));
        for (i, pair) in curr_level.chunks(2).enumerate() {
            let left = pair[0];
            // Duplicate the last element if the level is odd.
            let right = pair.get(1).copied().unwrap_or(left);

            if i == curr_index / 2 {
                cohashes.push(if curr_index.is_multiple_of(2) { right } else { left });
            }

            next_level.push(hash_pair(&left, &right));
        }

        curr_index /= 2;
        curr_level = next_level;
    }

    Some((cohashes, curr_level[0]))
}

/// Merkle root over a block's txids, or `None` for an empty list.
pub fn compute_root(txids: &[Txid]) -> Option<TxMerkleNode> {
    build_proof(txids, 0).map(|(_, root)| TxMerkleNode::from_byte_array(root.0))
}

/// Checks that `txid` is included in the block described by `header`.
///
/// Fails fast on the first structural problem. The header is whatever the
/// caller believes the proof refers to; it is not looked up here.
pub fn verify_proof(
    txid: Txid,
    proof: &DepositProof,
    header: &ParentHeader,
) -> Result<(), ProofError> {
    if proof.block_hash() != header.hash() {
        return Err(ProofError::HeaderMismatch {
            proof: proof.block_hash(),
            header: header.hash(),
        });
    }

    let siblings = proof.siblings();
    if siblings.len() > MAX_PROOF_DEPTH {
        return Err(ProofError::TooDeep(siblings.len()));
    }

    let position = proof.position();
    if (position as u64) >> siblings.len() != 0 {
        return Err(ProofError::PositionOutOfRange {
            position,
            depth: siblings.len(),
        });
    }

    let mut cur = Buf32::from(txid.to_byte_array());
    for (level, sibling) in siblings.iter().enumerate() {
        let is_right = (position >> level) & 1 == 1;
        if is_right {
            // A right child equal to its sibling only exists as the phantom
            // copy of an odd level's last node.
            if *sibling == cur {
                return Err(ProofError::DuplicatedNode(level));
            }
            cur = hash_pair(sibling, &cur);
        } else {
            cur = hash_pair(&cur, sibling);
        }
    }

    let computed = TxMerkleNode::from_byte_array(cur.0);
    if computed != header.merkle_root() {
        return Err(ProofError::RootMismatch {
            computed,
            expected: header.merkle_root(),
        });
    }

    Ok(())
}

/// Boolean form of [`verify_proof`] for a decoded deposit.
pub fn verify(deposit: &DepositTransaction, proof: &DepositProof, header: &ParentHeader) -> bool {
    match verify_proof(deposit.txid(), proof, header) {
        Ok(()) => true,
        Err(e) => {
            debug!(txid = %deposit.txid(), %e, "merkle proof rejected");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::{
        absolute::LockTime, block, transaction::Version, Amount, Block, BlockHash,
        CompactTarget, ScriptBuf, Transaction, TxOut,
    };
    use proptest::prelude::*;

    use super::*;

    fn txids(n: usize) -> Vec<Txid> {
        (0..n)
            .map(|i| Txid::from_byte_array([i as u8 + 1; 32]))
            .collect()
    }

    fn header_for(txids: &[Txid]) -> ParentHeader {
        ParentHeader::new(
            BlockHash::from_byte_array([0xbb; 32]),
            BlockHash::all_zeros(),
            compute_root(txids).unwrap(),
            1,
        )
    }

    fn proof_for(txids: &[Txid], index: u32) -> DepositProof {
        let (siblings, _) = build_proof(txids, index).unwrap();
        DepositProof::new(BlockHash::from_byte_array([0xbb; 32]), siblings, index)
    }

    #[test]
    fn test_root_matches_bitcoin() {
        let txdata: Vec<Transaction> = (0..5u64)
            .map(|i| Transaction {
                version: Version::ONE,
                lock_time: LockTime::from_consensus(i as u32),
                input: vec![],
                output: vec![TxOut {
                    value: Amount::from_sat(i),
                    script_pubkey: ScriptBuf::new(),
                }],
            })
            .collect();
        let ids: Vec<Txid> = txdata.iter().map(|t| t.compute_txid()).collect();

        let block = Block {
            header: block::Header {
                version: block::Version::ONE,
                prev_blockhash: BlockHash::all_zeros(),
                merkle_root: TxMerkleNode::all_zeros(),
                time: 0,
                bits: CompactTarget::from_consensus(0x207fffff),
                nonce: 0,
            },
            txdata,
        };

        assert_eq!(compute_root(&ids), block.compute_merkle_root());
    }

    #[test]
    fn test_single_tx_block() {
        let ids = txids(1);
        let header = header_for(&ids);
        assert_eq!(header.merkle_root().to_byte_array(), ids[0].to_byte_array());
        verify_proof(ids[0], &proof_for(&ids, 0), &header).unwrap();
    }

    #[test]
    fn test_odd_last_leaf() {
        let ids = txids(5);
        let header = header_for(&ids);
        verify_proof(ids[4], &proof_for(&ids, 4), &header).unwrap();
    }

    #[test]
    fn test_phantom_duplicate_rejected() {
        // Leaf 5 of a 5-leaf tree does not exist, but a path to it through the
        // duplicated node would hash to the real root.
        let ids = txids(5);
        let header = header_for(&ids);
        let (mut siblings, _) = build_proof(&ids, 4).unwrap();
        siblings[0] = Buf32::from(ids[4].to_byte_array());
        let proof = DepositProof::new(header.hash(), siblings, 5);
        assert_eq!(
            verify_proof(ids[4], &proof, &header),
            Err(ProofError::DuplicatedNode(0))
        );
    }

    #[test]
    fn test_wrong_header() {
        let ids = txids(4);
        let header = ParentHeader::new(
            BlockHash::from_byte_array([0xcc; 32]),
            BlockHash::all_zeros(),
            compute_root(&ids).unwrap(),
            1,
        );
        assert!(matches!(
            verify_proof(ids[1], &proof_for(&ids, 1), &header),
            Err(ProofError::HeaderMismatch { .. })
        ));
    }

    #[test]
    fn test_position_bits_beyond_depth() {
        let ids = txids(4);
        let header = header_for(&ids);
        let (siblings, _) = build_proof(&ids, 1).unwrap();
        let proof = DepositProof::new(header.hash(), siblings, 1 | (1 << 2));
        assert_eq!(
            verify_proof(ids[1], &proof, &header),
            Err(ProofError::PositionOutOfRange {
                position: 5,
                depth: 2
            })
        );
    }

    #[test]
    fn test_too_many_siblings() {
        let ids = txids(2);
        let header = header_for(&ids);
        let proof = DepositProof::new(header.hash(), vec![Buf32::zero(); MAX_PROOF_DEPTH + 1], 0);
        assert_eq!(
            verify_proof(ids[0], &proof, &header),
            Err(ProofError::TooDeep(MAX_PROOF_DEPTH + 1))
        );
    }

    #[test]
    fn test_build_proof_out_of_range() {
        assert!(build_proof(&txids(3), 3).is_none());
        assert!(compute_root(&[]).is_none());
    }

    proptest! {
        #[test]
        fn test_every_leaf_proves(n in 1usize..40, seed in any::<u8>()) {
            let ids: Vec<Txid> = (0..n)
                .map(|i| Txid::from_byte_array([seed.wrapping_add(i as u8); 32]))
                .collect();
            let header = header_for(&ids);
            for i in 0..n {
                let proof = proof_for(&ids, i as u32);
                prop_assert!(verify_proof(ids[i], &proof, &header).is_ok());
            }
        }

        #[test]
        fn test_flipped_sibling_fails(n in 2usize..40, idx in any::<prop::sample::Index>(), bit in 0usize..256) {
            let ids = txids(n);
            let i = idx.index(n);
            let header = header_for(&ids);
            let (mut siblings, _) = build_proof(&ids, i as u32).unwrap();
            let level = bit % siblings.len();
            siblings[level].0[(bit / 8) % 32] ^= 1 << (bit % 8);
            let proof = DepositProof::new(header.hash(), siblings, i as u32);
            prop_assert!(verify_proof(ids[i], &proof, &header).is_err());
        }
    }
}
