//! `checkpegin` subcommand: read-only claimability report for a deposit.

use std::slice;

use anyhow::Context;
use fedpeg_config::RegistryBackend;
use fedpeg_db_store_sled::SledClaimDb;
use fedpeg_db_types::{ClaimDatabase, MemClaimDb};
use fedpeg_pegin::{ClaimScriptHint, PeginValidator, RejectReason};
use fedpeg_primitives::DepositProof;
use serde_json::json;
use tracing::*;

use crate::{
    args::{CmdContext, SubcCheckPegin},
    util::{load_headers, parse_claim_script},
};

const NEEDS_MORE_CONFIRMATIONS: &str =
    "Peg-in Bitcoin transaction needs more confirmations to be sent.";

pub(crate) fn exec(cmd: SubcCheckPegin, ctx: &CmdContext) -> anyhow::Result<()> {
    match ctx.config.registry.backend {
        RegistryBackend::Memory => check(cmd, ctx, MemClaimDb::new()),
        RegistryBackend::Sled => {
            let db = SledClaimDb::open(&ctx.config.registry.datadir)?;
            check(cmd, ctx, db)
        }
    }
}

fn check<D: ClaimDatabase>(cmd: SubcCheckPegin, ctx: &CmdContext, db: D) -> anyhow::Result<()> {
    let claim_script = parse_claim_script(&cmd.claim_script)?;
    let raw_tx = hex::decode(cmd.raw_tx.trim()).context("Given raw tx is not hex.")?;
    let proof_bytes = hex::decode(cmd.proof.trim()).context("Given proof is not hex.")?;
    let proof = DepositProof::from_bytes(&proof_bytes).context("Failed to decode proof.")?;
    let chain = load_headers(&cmd.headers, cmd.anchor_height)?;

    let validator = PeginValidator::new(ctx.params.clone(), db)?;
    let Some((deposit, _)) = validator.locate_deposit(&raw_tx, slice::from_ref(&claim_script))?
    else {
        return Err(RejectReason::ScriptMismatch.into());
    };
    debug!(txid = %deposit.txid(), vout = deposit.vout(), "located deposit output");

    let hint = ClaimScriptHint::Explicit(&claim_script);
    let inspection = validator.inspect_claim(&chain, &deposit, &proof, hint)?;
    let key = inspection.claim.key();
    let state = validator.registry().lookup(&key)?;

    let report = json!({
        "txid": key.parent_txid().to_string(),
        "vout": key.vout(),
        "value": inspection.claim.credited_amount.to_sat(),
        "is_coinbase": inspection.claim.is_coinbase,
        "confirmations": inspection.confirmations,
        "required_depth": inspection.required_depth,
        "required_depth_with_buffer": validator
            .policy()
            .required_depth_with_buffer(inspection.claim.is_coinbase),
        "mature": inspection.mature,
        "claim_state": serde_json::to_value(state)?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !inspection.mature_with_buffer {
        println!("{NEEDS_MORE_CONFIRMATIONS}");
    }
    Ok(())
}
