use bitcoin::{Address, Network, Script, ScriptBuf};
use fedpeg_primitives::DepositScriptType;
use tracing::*;

use crate::{
    contract::{tweak_fedpeg_script, tweakable_key_count},
    errors::ClaimScriptError,
};

/// Computes the parent-chain output script a deposit for `claim_script` must
/// pay to.
pub fn derive(
    claim_script: &Script,
    fedpeg_script: &Script,
    script_type: DepositScriptType,
) -> Result<ScriptBuf, ClaimScriptError> {
    let tweaked = tweak_fedpeg_script(fedpeg_script, claim_script)?;
    let p2wsh = ScriptBuf::new_p2wsh(&tweaked.wscript_hash());
    Ok(match script_type {
        DepositScriptType::P2wsh => p2wsh,
        DepositScriptType::P2shP2wsh => ScriptBuf::new_p2sh(&p2wsh.script_hash()),
    })
}

/// [`derive`] bound to one federation script.
#[derive(Clone, Debug)]
pub struct ClaimScriptDeriver {
    fedpeg_script: ScriptBuf,
    script_type: DepositScriptType,
}

impl ClaimScriptDeriver {
    /// Fails if the federation script has nothing to tweak, since every
    /// claim would then share one deposit address.
    pub fn new(
        fedpeg_script: ScriptBuf,
        script_type: DepositScriptType,
    ) -> Result<Self, ClaimScriptError> {
        if tweakable_key_count(&fedpeg_script)? == 0 {
            return Err(ClaimScriptError::NoTweakableKeys);
        }
        Ok(Self {
            fedpeg_script,
            script_type,
        })
    }

    pub fn fedpeg_script(&self) -> &Script {
        &self.fedpeg_script
    }

    pub fn script_type(&self) -> DepositScriptType {
        self.script_type
    }

    pub fn deposit_script(&self, claim_script: &Script) -> Result<ScriptBuf, ClaimScriptError> {
        derive(claim_script, &self.fedpeg_script, self.script_type)
    }

    /// The tweaked federation script itself, which the federation needs to
    /// spend the deposit.
    pub fn witness_script(&self, claim_script: &Script) -> Result<ScriptBuf, ClaimScriptError> {
        tweak_fedpeg_script(&self.fedpeg_script, claim_script)
    }

    pub fn deposit_address(
        &self,
        claim_script: &Script,
        network: Network,
    ) -> Result<Address, ClaimScriptError> {
        let script = self.deposit_script(claim_script)?;
        Address::from_script(&script, network).map_err(|e| ClaimScriptError::Address(e.to_string()))
    }

    /// Whether a deposit paying to `output_script` is claimable by `claim_script`.
    pub fn matches(&self, claim_script: &Script, output_script: &Script) -> bool {
        match self.deposit_script(claim_script) {
            Ok(expected) => expected.as_script() == output_script,
            Err(e) => {
                warn!(%e, "failed to derive deposit script");
                false
            }
        }
    }

    /// Returns the first candidate claim script that `output_script` pays to.
    pub fn find_match<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a Script>,
        output_script: &Script,
    ) -> Option<&'a Script> {
        candidates
            .into_iter()
            .find(|c| self.matches(c, output_script))
    }
}
