//! `peginaddress` subcommand: derives where to send a deposit.

use fedpeg_claim_script::ClaimScriptDeriver;
use serde_json::json;

use crate::{
    args::{CmdContext, SubcPeginAddress},
    util::parse_claim_script,
};

/// Prints the deposit address together with the scripts behind it.
pub(crate) fn exec(cmd: SubcPeginAddress, ctx: &CmdContext) -> anyhow::Result<()> {
    let claim_script = parse_claim_script(&cmd.claim_script)?;
    let deriver =
        ClaimScriptDeriver::new(ctx.params.fedpeg_script.clone(), ctx.params.deposit_script_type)?;

    let address = deriver.deposit_address(&claim_script, ctx.params.parent_network)?;
    let report = json!({
        "mainchain_address": address.to_string(),
        "claim_script": claim_script.to_hex_string(),
        "deposit_script": deriver.deposit_script(&claim_script)?.to_hex_string(),
        "witness_script": deriver.witness_script(&claim_script)?.to_hex_string(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
