use bitcoin::{
    hashes::Hash,
    opcodes::all::OP_RETURN,
    script::{Builder, Instruction, PushBytesBuf},
    BlockHash, Script, ScriptBuf,
};
use serde::{Deserialize, Serialize};

use crate::errors::PegoutError;

/// What a peg-out output commits to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PegoutPayload {
    /// Genesis hash of the chain the funds should be released on.
    pub genesis_hash: BlockHash,
    /// Parent-chain script the funds should be paid to. Opaque here.
    pub destination_script: ScriptBuf,
}

/// Builds `OP_RETURN <genesis hash> <destination script>`.
///
/// The destination is pushed verbatim whatever its length or content.
pub fn encode(genesis_hash: BlockHash, destination: &Script) -> Result<ScriptBuf, PegoutError> {
    let genesis = PushBytesBuf::from(genesis_hash.to_byte_array());
    let dest = PushBytesBuf::try_from(destination.to_bytes())
        .map_err(|_| PegoutError::MalformedDestination("destination too large".to_owned()))?;
    Ok(Builder::new()
        .push_opcode(OP_RETURN)
        .push_slice(genesis)
        .push_slice(dest)
        .into_script())
}

pub fn is_pegout_script(script: &Script) -> bool {
    script.is_op_return()
}

/// Inverse of [`encode`]. Anything other than exactly the three expected
/// elements is malformed.
pub fn decode_pegout(script: &Script) -> Result<PegoutPayload, PegoutError> {
    let malformed = |why: &str| PegoutError::MalformedDestination(why.to_owned());

    let mut ins = script.instructions();
    match ins.next() {
        Some(Ok(Instruction::Op(op))) if op == OP_RETURN => {}
        _ => return Err(malformed("not a null-data output")),
    }

    let genesis = match ins.next() {
        Some(Ok(Instruction::PushBytes(data))) => <[u8; 32]>::try_from(data.as_bytes())
            .map_err(|_| malformed("genesis commitment is not 32 bytes"))?,
        _ => return Err(malformed("missing genesis commitment")),
    };

    let destination = match ins.next() {
        Some(Ok(Instruction::PushBytes(data))) => ScriptBuf::from_bytes(data.as_bytes().to_vec()),
        _ => return Err(malformed("missing destination script")),
    };

    if ins.next().is_some() {
        return Err(malformed("trailing data after destination"));
    }

    Ok(PegoutPayload {
        genesis_hash: BlockHash::from_byte_array(genesis),
        destination_script: destination,
    })
}
