use std::{
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use bitcoin::{hashes::Hash, Txid};
use fedpeg_db_types::{traits::ClaimDatabase, CasOutcome, ClaimWrite, DbError};
use fedpeg_primitives::{ClaimKey, ClaimState, SidechainBlockId, SidechainTxid};

fn key(n: u8, vout: u32) -> ClaimKey {
    ClaimKey::new(Txid::from_byte_array([n; 32]), vout)
}

fn pending(n: u8) -> ClaimState {
    ClaimState::Pending {
        sidechain_txid: SidechainTxid::from([n; 32]),
    }
}

fn finalized(n: u8, blk: u8) -> ClaimState {
    ClaimState::Finalized {
        sidechain_txid: SidechainTxid::from([n; 32]),
        block: SidechainBlockId::from([blk; 32]),
    }
}

pub fn test_missing_key_is_unclaimed(db: &impl ClaimDatabase) {
    assert_eq!(db.get_claim(&key(1, 0)).unwrap(), ClaimState::Unclaimed);
    assert!(db.get_all_claims().unwrap().is_empty());
}

pub fn test_cas_transitions(db: &impl ClaimDatabase) {
    let k = key(1, 0);

    let res = db
        .compare_and_swap(&k, &ClaimState::Unclaimed, &pending(1))
        .unwrap();
    assert_eq!(res, CasOutcome::Applied);
    assert_eq!(db.get_claim(&k).unwrap(), pending(1));

    let res = db
        .compare_and_swap(&k, &pending(1), &finalized(1, 9))
        .unwrap();
    assert_eq!(res, CasOutcome::Applied);
    assert_eq!(db.get_claim(&k).unwrap(), finalized(1, 9));
}

pub fn test_cas_conflict_reports_current(db: &impl ClaimDatabase) {
    let k = key(2, 3);
    db.compare_and_swap(&k, &ClaimState::Unclaimed, &pending(1))
        .unwrap();

    let res = db
        .compare_and_swap(&k, &ClaimState::Unclaimed, &pending(2))
        .unwrap();
    assert_eq!(
        res,
        CasOutcome::Conflict {
            key: k,
            current: pending(1)
        }
    );
    assert_eq!(db.get_claim(&k).unwrap(), pending(1));
}

pub fn test_cas_to_unclaimed_deletes(db: &impl ClaimDatabase) {
    let k = key(3, 0);
    db.compare_and_swap(&k, &ClaimState::Unclaimed, &finalized(1, 1))
        .unwrap();
    db.compare_and_swap(&k, &finalized(1, 1), &ClaimState::Unclaimed)
        .unwrap();

    assert_eq!(db.get_claim(&k).unwrap(), ClaimState::Unclaimed);
    assert!(db.get_all_claims().unwrap().is_empty());
}

pub fn test_batch_all_or_nothing(db: &impl ClaimDatabase) {
    let (a, b, c) = (key(4, 0), key(4, 1), key(5, 0));
    db.compare_and_swap(&c, &ClaimState::Unclaimed, &pending(7))
        .unwrap();

    // Third expectation is stale, so nothing may be written.
    let res = db
        .apply_batch(&[
            ClaimWrite::new(a, ClaimState::Unclaimed, finalized(1, 1)),
            ClaimWrite::new(b, ClaimState::Unclaimed, finalized(2, 1)),
            ClaimWrite::new(c, ClaimState::Unclaimed, finalized(3, 1)),
        ])
        .unwrap();
    assert_eq!(
        res,
        CasOutcome::Conflict {
            key: c,
            current: pending(7)
        }
    );
    assert_eq!(db.get_claim(&a).unwrap(), ClaimState::Unclaimed);
    assert_eq!(db.get_claim(&b).unwrap(), ClaimState::Unclaimed);

    let res = db
        .apply_batch(&[
            ClaimWrite::new(a, ClaimState::Unclaimed, finalized(1, 1)),
            ClaimWrite::new(b, ClaimState::Unclaimed, finalized(2, 1)),
            ClaimWrite::new(c, pending(7), finalized(3, 1)),
        ])
        .unwrap();
    assert!(res.is_applied());
    assert_eq!(db.get_claim(&c).unwrap(), finalized(3, 1));
}

pub fn test_batch_rejects_repeated_key(db: &impl ClaimDatabase) {
    let a = key(6, 0);
    let res = db.apply_batch(&[
        ClaimWrite::new(a, ClaimState::Unclaimed, pending(1)),
        ClaimWrite::new(a, pending(1), finalized(1, 1)),
    ]);
    assert!(matches!(res, Err(DbError::DuplicateBatchKey(k)) if k == a));
    assert_eq!(db.get_claim(&a).unwrap(), ClaimState::Unclaimed);
}

pub fn test_get_all_claims_in_key_order(db: &impl ClaimDatabase) {
    for (k, s) in [
        (key(9, 2), pending(1)),
        (key(8, 0), pending(2)),
        (key(9, 1), finalized(3, 3)),
    ] {
        db.compare_and_swap(&k, &ClaimState::Unclaimed, &s).unwrap();
    }

    let keys: Vec<_> = db
        .get_all_claims()
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, vec![key(8, 0), key(9, 1), key(9, 2)]);
}

pub fn test_concurrent_cas_single_winner(db: &impl ClaimDatabase) {
    let k = key(10, 0);
    let winners = AtomicUsize::new(0);

    thread::scope(|s| {
        for i in 0..8u8 {
            let winners = &winners;
            s.spawn(move || {
                let res = db
                    .compare_and_swap(&k, &ClaimState::Unclaimed, &pending(i))
                    .unwrap();
                if res.is_applied() {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
    });

    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert!(matches!(db.get_claim(&k).unwrap(), ClaimState::Pending { .. }));
}

#[macro_export]
macro_rules! claim_db_tests {
    ($setup_expr:expr) => {
        #[test]
        fn test_missing_key_is_unclaimed() {
            let db = $setup_expr;
            $crate::claim_tests::test_missing_key_is_unclaimed(&db);
        }

        #[test]
        fn test_cas_transitions() {
            let db = $setup_expr;
            $crate::claim_tests::test_cas_transitions(&db);
        }

        #[test]
        fn test_cas_conflict_reports_current() {
            let db = $setup_expr;
            $crate::claim_tests::test_cas_conflict_reports_current(&db);
        }

        #[test]
        fn test_cas_to_unclaimed_deletes() {
            let db = $setup_expr;
            $crate::claim_tests::test_cas_to_unclaimed_deletes(&db);
        }

        #[test]
        fn test_batch_all_or_nothing() {
            let db = $setup_expr;
            $crate::claim_tests::test_batch_all_or_nothing(&db);
        }

        #[test]
        fn test_batch_rejects_repeated_key() {
            let db = $setup_expr;
            $crate::claim_tests::test_batch_rejects_repeated_key(&db);
        }

        #[test]
        fn test_get_all_claims_in_key_order() {
            let db = $setup_expr;
            $crate::claim_tests::test_get_all_claims_in_key_order(&db);
        }

        #[test]
        fn test_concurrent_cas_single_winner() {
            let db = $setup_expr;
            $crate::claim_tests::test_concurrent_cas_single_winner(&db);
        }
    };
}
