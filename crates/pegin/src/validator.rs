use bitcoin::{consensus, Script, ScriptBuf, Transaction};
use fedpeg_claim_script::{ClaimScriptDeriver, ClaimScriptError};
use fedpeg_common::instrumentation::components;
use fedpeg_db_types::ClaimDatabase;
use fedpeg_pegout::{validate_pegout_tx, FeePolicy};
use fedpeg_primitives::{
    ClaimKey, ClaimState, DepositProof, DepositTransaction, ParentHeader, PegParams, PeginWitness,
    SidechainBlockId, SidechainTx, SidechainTxIn, SidechainTxid, ValidatedClaim,
};
use fedpeg_spv::{verify_proof, ConfirmationPolicy, ConfirmationState, ParentChainView};
use tracing::*;

use crate::{
    block::{check_duplicate_inputs, check_extra_witness},
    errors::{EngineFault, RejectReason, ValidationError, ValidationResult},
    registry::ClaimRegistry,
};

/// Which claim scripts a deposit may have been made for.
#[derive(Clone, Copy, Debug)]
pub enum ClaimScriptHint<'a> {
    /// The claimant names its script; it must match exactly.
    Explicit(&'a Script),
    /// Scripts the caller can derive itself, e.g. a wallet's own.
    Candidates(&'a [ScriptBuf]),
}

/// Where a peg-in is being validated, and what a successful validation
/// records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationContext {
    /// Admission of `sidechain_txid` to the mempool. Marks claims pending.
    Mempool { sidechain_txid: SidechainTxid },
    /// Inclusion of `sidechain_txid` in `block`. Finalizes claims.
    Block {
        sidechain_txid: SidechainTxid,
        block: SidechainBlockId,
    },
}

impl ValidationContext {
    pub fn sidechain_txid(&self) -> SidechainTxid {
        match self {
            Self::Mempool { sidechain_txid } | Self::Block { sidechain_txid, .. } => {
                *sidechain_txid
            }
        }
    }
}

/// Read-only report on a deposit, for wallets deciding whether to claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimInspection {
    pub claim: ValidatedClaim,
    pub confirmations: u64,
    pub required_depth: u64,
    pub mature: bool,
    pub mature_with_buffer: bool,
}

/// Decides whether peg-ins are valid and records the ones that are.
#[derive(Debug)]
pub struct PeginValidator<D> {
    pub(crate) params: PegParams,
    pub(crate) deriver: ClaimScriptDeriver,
    pub(crate) policy: ConfirmationPolicy,
    pub(crate) fees: FeePolicy,
    pub(crate) registry: ClaimRegistry<D>,
}

impl<D: ClaimDatabase> PeginValidator<D> {
    pub fn new(params: PegParams, db: D) -> Result<Self, ClaimScriptError> {
        let deriver =
            ClaimScriptDeriver::new(params.fedpeg_script.clone(), params.deposit_script_type)?;
        Ok(Self {
            policy: ConfirmationPolicy::from_params(&params.policy),
            fees: FeePolicy::from_params(&params.policy),
            deriver,
            registry: ClaimRegistry::new(db),
            params,
        })
    }

    pub fn params(&self) -> &PegParams {
        &self.params
    }

    pub fn deriver(&self) -> &ClaimScriptDeriver {
        &self.deriver
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    pub fn fees(&self) -> &FeePolicy {
        &self.fees
    }

    pub fn registry(&self) -> &ClaimRegistry<D> {
        &self.registry
    }

    /// Validates one deposit claim and, on success, records it according to
    /// `ctx`.
    #[instrument(
        skip_all,
        fields(component = components::PEGIN_VALIDATOR, parent_txid = %deposit.txid(), vout = deposit.vout())
    )]
    pub fn validate(
        &self,
        chain: &impl ParentChainView,
        deposit: &DepositTransaction,
        proof: &DepositProof,
        hint: ClaimScriptHint<'_>,
        ctx: ValidationContext,
    ) -> ValidationResult<ValidatedClaim> {
        let res = self.check_claim(chain, deposit, proof, hint, ctx).and_then(|claim| {
            let key = claim.key();
            match ctx {
                ValidationContext::Mempool { sidechain_txid } => {
                    self.registry.mark_pending(&[key], sidechain_txid)?
                }
                ValidationContext::Block {
                    sidechain_txid,
                    block,
                } => self.registry.mark_finalized(&[(key, sidechain_txid)], block)?,
            }
            Ok(claim)
        });
        log_outcome(res)
    }

    /// Destination, proof, maturity and registry checks, without recording
    /// anything.
    pub(crate) fn check_claim(
        &self,
        chain: &impl ParentChainView,
        deposit: &DepositTransaction,
        proof: &DepositProof,
        hint: ClaimScriptHint<'_>,
        ctx: ValidationContext,
    ) -> ValidationResult<ValidatedClaim> {
        let (claim, header) = self.check_deposit(chain, deposit, proof, hint)?;
        self.check_maturity(chain, &header, claim.is_coinbase)?;
        self.check_registry(claim.key(), ctx)?;
        Ok(claim)
    }

    fn check_deposit(
        &self,
        chain: &impl ParentChainView,
        deposit: &DepositTransaction,
        proof: &DepositProof,
        hint: ClaimScriptHint<'_>,
    ) -> Result<(ValidatedClaim, ParentHeader), RejectReason> {
        let output_script = deposit.script_pubkey();
        let matched = match hint {
            ClaimScriptHint::Explicit(claim_script) => {
                self.deriver.matches(claim_script, output_script)
            }
            ClaimScriptHint::Candidates(scripts) => self
                .deriver
                .find_match(scripts.iter().map(|s| s.as_script()), output_script)
                .is_some(),
        };
        if !matched {
            return Err(RejectReason::ScriptMismatch);
        }

        let header = chain
            .get_header(&proof.block_hash())
            .ok_or(RejectReason::HeaderNotFound(proof.block_hash()))?;
        verify_proof(deposit.txid(), proof, &header)?;

        let claim = ValidatedClaim {
            parent_txid: deposit.txid(),
            output_index: deposit.vout(),
            credited_amount: deposit.value(),
            is_coinbase: deposit.is_coinbase(),
        };
        Ok((claim, header))
    }

    fn check_maturity(
        &self,
        chain: &impl ParentChainView,
        header: &ParentHeader,
        is_coinbase: bool,
    ) -> Result<(), RejectReason> {
        let state = ConfirmationState::query(chain, header.height());
        if !self.policy.is_mature(&state, is_coinbase) {
            return Err(RejectReason::NeedsMoreConfirmations {
                confirmations: state.confirmations(),
                required: self.policy.required_depth(is_coinbase),
            });
        }
        Ok(())
    }

    fn check_registry(&self, key: ClaimKey, ctx: ValidationContext) -> ValidationResult<()> {
        let state = self.registry.lookup(&key)?;
        match (state, ctx) {
            (ClaimState::Unclaimed, _) => Ok(()),
            (ClaimState::Pending { sidechain_txid }, ValidationContext::Mempool { .. })
                if sidechain_txid != ctx.sidechain_txid() =>
            {
                Err(RejectReason::MempoolConflict {
                    key,
                    holder: sidechain_txid,
                }
                .into())
            }
            // A block may take over anyone's pending claim.
            (ClaimState::Pending { .. }, _) => Ok(()),
            (
                ClaimState::Finalized {
                    sidechain_txid,
                    block,
                },
                ValidationContext::Block {
                    sidechain_txid: txid,
                    block: blkid,
                },
            ) if sidechain_txid == txid && block == blkid => Ok(()),
            (ClaimState::Finalized { sidechain_txid, .. }, _) => Err(RejectReason::AlreadyClaimed {
                key,
                holder: sidechain_txid,
            }
            .into()),
        }
    }

    /// Decodes a peg-in input's witness and checks it against the parent
    /// output it claims, then runs [`Self::check_claim`].
    pub(crate) fn check_pegin_input(
        &self,
        chain: &impl ParentChainView,
        input: &SidechainTxIn,
        ctx: ValidationContext,
    ) -> ValidationResult<ValidatedClaim> {
        let malformed = |why: String| ValidationError::from(RejectReason::MalformedPeginWitness(why));

        let witness =
            PeginWitness::from_stack(&input.pegin_witness).map_err(|e| malformed(e.to_string()))?;

        if witness.genesis_hash != self.params.parent_genesis_hash {
            return Err(malformed(format!(
                "Parent genesis block mismatch: {}",
                witness.genesis_hash
            )));
        }

        let key = input.prevout.as_claim_key();
        let deposit = DepositTransaction::from_raw(&witness.raw_parent_tx, key.vout())
            .map_err(|e| malformed(e.to_string()))?;
        if deposit.txid() != key.parent_txid() {
            return Err(malformed(
                "prevout does not reference the witness transaction".to_owned(),
            ));
        }
        if deposit.value() != witness.value {
            return Err(malformed(format!(
                "Value {} does not match parent output {}",
                witness.value.to_sat(),
                deposit.value().to_sat()
            )));
        }

        self.check_claim(
            chain,
            &deposit,
            &witness.proof,
            ClaimScriptHint::Explicit(&witness.claim_script),
            ctx,
        )
    }

    /// Admits a sidechain tx to the mempool, marking all its claims pending
    /// together.
    #[instrument(
        skip_all,
        fields(component = components::PEGIN_VALIDATOR, sidechain_txid = %tx.compute_txid())
    )]
    pub fn admit_transaction(
        &self,
        chain: &impl ParentChainView,
        tx: &SidechainTx,
    ) -> ValidationResult<Vec<ValidatedClaim>> {
        log_outcome(self.admit(chain, tx))
    }

    fn admit(
        &self,
        chain: &impl ParentChainView,
        tx: &SidechainTx,
    ) -> ValidationResult<Vec<ValidatedClaim>> {
        check_duplicate_inputs(tx)?;
        check_extra_witness(tx)?;

        let txid = tx.compute_txid();
        let ctx = ValidationContext::Mempool {
            sidechain_txid: txid,
        };
        let claims = tx
            .pegin_inputs()
            .map(|input| self.check_pegin_input(chain, input, ctx))
            .collect::<ValidationResult<Vec<_>>>()?;

        validate_pegout_tx(tx, self.params.parent_genesis_hash, &self.fees)?;

        let keys: Vec<_> = claims.iter().map(|c| c.key()).collect();
        self.registry.mark_pending(&keys, txid)?;
        if !claims.is_empty() {
            info!(n_claims = claims.len(), "peg-in tx admitted");
        }
        Ok(claims)
    }

    /// Drops the pending claims of a tx leaving the mempool without being
    /// mined. Returns how many were released.
    #[instrument(
        skip_all,
        fields(component = components::PEGIN_VALIDATOR, sidechain_txid = %tx.compute_txid())
    )]
    pub fn release_transaction(&self, tx: &SidechainTx) -> Result<usize, EngineFault> {
        let txid = tx.compute_txid();

        let mut released = 0;
        for key in tx.pegin_keys() {
            if self.registry.release_pending(key, txid)? {
                released += 1;
            }
        }
        Ok(released)
    }

    /// Checks destination and proof and reports maturity, without looking at
    /// or changing the registry.
    pub fn inspect_claim(
        &self,
        chain: &impl ParentChainView,
        deposit: &DepositTransaction,
        proof: &DepositProof,
        hint: ClaimScriptHint<'_>,
    ) -> ValidationResult<ClaimInspection> {
        let (claim, header) = self.check_deposit(chain, deposit, proof, hint)?;
        let state = ConfirmationState::query(chain, header.height());
        Ok(ClaimInspection {
            claim,
            confirmations: state.confirmations(),
            required_depth: self.policy.required_depth(claim.is_coinbase),
            mature: self.policy.is_mature(&state, claim.is_coinbase),
            mature_with_buffer: self.policy.is_mature_with_buffer(&state, claim.is_coinbase),
        })
    }

    /// Wallet-side gate before building a claim tx. Waits for the buffered
    /// depth and refuses deposits someone already claimed.
    pub fn claim_pegin(
        &self,
        chain: &impl ParentChainView,
        deposit: &DepositTransaction,
        proof: &DepositProof,
        hint: ClaimScriptHint<'_>,
    ) -> ValidationResult<ValidatedClaim> {
        let inspection = self.inspect_claim(chain, deposit, proof, hint)?;
        if !inspection.mature_with_buffer {
            return Err(RejectReason::NeedsMoreConfirmations {
                confirmations: inspection.confirmations,
                required: self
                    .policy
                    .required_depth_with_buffer(inspection.claim.is_coinbase),
            }
            .into());
        }

        let key = inspection.claim.key();
        match self.registry.lookup(&key)? {
            ClaimState::Unclaimed => Ok(inspection.claim),
            ClaimState::Pending { sidechain_txid } => Err(RejectReason::MempoolConflict {
                key,
                holder: sidechain_txid,
            }
            .into()),
            ClaimState::Finalized { sidechain_txid, .. } => Err(RejectReason::AlreadyClaimed {
                key,
                holder: sidechain_txid,
            }
            .into()),
        }
    }

    /// Finds the first output of `raw_tx` paying to the deposit script of one
    /// of `candidates`, returning it with the matching claim script.
    pub fn locate_deposit(
        &self,
        raw_tx: &[u8],
        candidates: &[ScriptBuf],
    ) -> Result<Option<(DepositTransaction, ScriptBuf)>, RejectReason> {
        let tx: Transaction = consensus::deserialize(raw_tx).map_err(|e| {
            RejectReason::MalformedPeginWitness(format!("Failed to decode parent tx: {e}"))
        })?;

        let found = tx.output.iter().enumerate().find_map(|(vout, out)| {
            self.deriver
                .find_match(candidates.iter().map(|s| s.as_script()), &out.script_pubkey)
                .map(|s| (vout as u32, s.to_owned()))
        });

        match found {
            Some((vout, claim_script)) => {
                let deposit = DepositTransaction::from_tx(tx, vout)
                    .map_err(|e| RejectReason::MalformedPeginWitness(e.to_string()))?;
                Ok(Some((deposit, claim_script)))
            }
            None => Ok(None),
        }
    }
}

pub(crate) fn log_outcome<T>(res: ValidationResult<T>) -> ValidationResult<T> {
    if let Err(e) = &res {
        match e {
            ValidationError::Rejected(reason) => debug!(%reason, "peg-in rejected"),
            ValidationError::Fault(fault) => error!(%fault, "peg-in engine fault"),
        }
    }
    res
}
