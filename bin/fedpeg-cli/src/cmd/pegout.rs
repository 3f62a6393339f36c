//! `encodepegout` and `decodepegout` subcommands.

use bitcoin::ScriptBuf;
use fedpeg_pegout::{classify_destination, decode_pegout, encode, parse_destination};
use serde_json::json;

use crate::args::{CmdContext, SubcDecodePegout, SubcEncodePegout};

pub(crate) fn exec_encode(cmd: SubcEncodePegout, ctx: &CmdContext) -> anyhow::Result<()> {
    let destination = parse_destination(cmd.address.trim(), ctx.params.parent_network)?;
    let script = encode(ctx.params.parent_genesis_hash, &destination)?;
    println!("{}", script.to_hex_string());
    Ok(())
}

pub(crate) fn exec_decode(cmd: SubcDecodePegout, ctx: &CmdContext) -> anyhow::Result<()> {
    let bytes = hex::decode(cmd.script.trim())
        .map_err(|_| anyhow::anyhow!("Given script is not hex."))?;
    let payload = decode_pegout(&ScriptBuf::from_bytes(bytes))?;
    let info = classify_destination(&payload.destination_script, ctx.params.parent_network);

    let report = json!({
        "genesis_hash": payload.genesis_hash.to_string(),
        "genesis_matches": payload.genesis_hash == ctx.params.parent_genesis_hash,
        "scriptPubKey": payload.destination_script.to_hex_string(),
        "type": info.kind.as_str(),
        "reqSigs": info.req_sigs(),
        "address": info.address.map(|a| a.to_string()),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
