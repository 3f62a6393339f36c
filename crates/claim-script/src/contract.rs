use bitcoin::{
    hashes::{hmac, sha256, Hash, HashEngine},
    opcodes::all::OP_ELSE,
    script::{Builder, Instruction},
    Script, ScriptBuf,
};
use secp256k1::{PublicKey, Scalar, SECP256K1};

use crate::errors::ClaimScriptError;

/// `HMAC-SHA256(key = pubkey, msg = claim_script)`.
fn commitment(pubkey: &PublicKey, claim_script: &Script) -> [u8; 32] {
    let mut engine = hmac::HmacEngine::<sha256::Hash>::new(&pubkey.serialize());
    engine.input(claim_script.as_bytes());
    hmac::Hmac::<sha256::Hash>::from_engine(engine).to_byte_array()
}

fn as_tweakable(data: &[u8]) -> Option<PublicKey> {
    if data.len() != 33 {
        return None;
    }
    PublicKey::from_slice(data).ok()
}

/// Number of federation keys [`tweak_fedpeg_script`] would tweak.
///
/// Keys after the first `OP_ELSE` belong to the emergency branch and are not
/// counted.
pub fn tweakable_key_count(fedpeg_script: &Script) -> Result<usize, ClaimScriptError> {
    let mut count = 0;
    for ins in fedpeg_script.instructions() {
        match ins? {
            Instruction::Op(op) if op == OP_ELSE => break,
            Instruction::PushBytes(data) if as_tweakable(data.as_bytes()).is_some() => count += 1,
            _ => {}
        }
    }
    Ok(count)
}

/// Rebuilds `fedpeg_script` with every compressed pubkey `P` before the first
/// `OP_ELSE` replaced by `P + commitment(P, claim_script)·G`. Everything else
/// is copied through.
pub fn tweak_fedpeg_script(
    fedpeg_script: &Script,
    claim_script: &Script,
) -> Result<ScriptBuf, ClaimScriptError> {
    let mut builder = Builder::new();
    let mut tweaked = 0;
    let mut past_else = false;

    for ins in fedpeg_script.instructions() {
        match ins? {
            Instruction::PushBytes(data) => {
                match as_tweakable(data.as_bytes()).filter(|_| !past_else) {
                    Some(pk) => {
                        let tweak = Scalar::from_be_bytes(commitment(&pk, claim_script))
                            .map_err(|_| ClaimScriptError::TweakFailed { index: tweaked })?;
                        let tweaked_pk = pk
                            .add_exp_tweak(SECP256K1, &tweak)
                            .map_err(|_| ClaimScriptError::TweakFailed { index: tweaked })?;
                        builder = builder.push_key(&bitcoin::PublicKey::new(tweaked_pk));
                        tweaked += 1;
                    }
                    None => builder = builder.push_slice(data),
                }
            }
            Instruction::Op(op) => {
                if op == OP_ELSE {
                    past_else = true;
                }
                builder = builder.push_opcode(op);
            }
        }
    }

    if tweaked == 0 {
        return Err(ClaimScriptError::NoTweakableKeys);
    }
    Ok(builder.into_script())
}
