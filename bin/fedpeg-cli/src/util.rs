//! Helpers shared by the `fedpeg-cli` subcommands.

use std::{fs, path::Path};

use anyhow::Context;
use bitcoin::{block::Header, consensus, ScriptBuf};
use fedpeg_primitives::ParentHeader;
use fedpeg_spv::HeaderChain;

use crate::{
    args::{CmdContext, Subcommand},
    cmd::{check_pegin, pegin_address, pegout},
};

/// Executes a subcommand.
pub(crate) fn exec_subc(cmd: Subcommand, ctx: &CmdContext) -> anyhow::Result<()> {
    match cmd {
        Subcommand::PeginAddress(subc) => pegin_address::exec(subc, ctx),
        Subcommand::CheckPegin(subc) => check_pegin::exec(subc, ctx),
        Subcommand::EncodePegout(subc) => pegout::exec_encode(subc, ctx),
        Subcommand::DecodePegout(subc) => pegout::exec_decode(subc, ctx),
    }
}

/// Parses a user-supplied claim script.
pub(crate) fn parse_claim_script(raw: &str) -> anyhow::Result<ScriptBuf> {
    let bytes =
        hex::decode(raw.trim()).map_err(|_| anyhow::anyhow!("Given claim_script is not hex."))?;
    Ok(ScriptBuf::from_bytes(bytes))
}

/// Reads a header file into a [`HeaderChain`]. The first header becomes the
/// anchor at `anchor_height`; every later one must extend the previous.
pub(crate) fn load_headers(path: &Path, anchor_height: u64) -> anyhow::Result<HeaderChain> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read headers from {}", path.display()))?;

    let mut headers = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(i, line)| {
            let bytes = hex::decode(line).with_context(|| format!("header {i} is not hex"))?;
            consensus::deserialize::<Header>(&bytes)
                .with_context(|| format!("header {i} is not a block header"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?
        .into_iter();

    let Some(anchor) = headers.next() else {
        anyhow::bail!("no headers in {}", path.display());
    };

    let mut chain = HeaderChain::new(
        ParentHeader::from_block_header(&anchor, anchor_height),
        headers.len() + 1,
    );
    for header in headers {
        chain.connect(&header)?;
    }
    Ok(chain)
}
