use std::fmt;

use bitcoin::{address::NetworkUnchecked, Address, Network, Script, ScriptBuf};
use serde::{Deserialize, Serialize};

use crate::errors::PegoutError;

/// Standard output types a peg-out destination can be recognised as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationType {
    #[serde(rename = "pubkeyhash")]
    PubkeyHash,
    #[serde(rename = "scripthash")]
    ScriptHash,
    WitnessV0Keyhash,
    WitnessV0Scripthash,
    WitnessV1Taproot,
    Nonstandard,
}

impl DestinationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PubkeyHash => "pubkeyhash",
            Self::ScriptHash => "scripthash",
            Self::WitnessV0Keyhash => "witness_v0_keyhash",
            Self::WitnessV0Scripthash => "witness_v0_scripthash",
            Self::WitnessV1Taproot => "witness_v1_taproot",
            Self::Nonstandard => "nonstandard",
        }
    }
}

impl fmt::Display for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DestinationInfo {
    pub kind: DestinationType,
    /// Set for every kind but [`DestinationType::Nonstandard`].
    pub address: Option<Address>,
}

impl DestinationInfo {
    /// Signatures needed to spend the destination. Always one for the
    /// standard single-key and hash types.
    pub fn req_sigs(&self) -> Option<u32> {
        self.address.as_ref().map(|_| 1)
    }
}

pub fn classify_destination(script: &Script, network: Network) -> DestinationInfo {
    let kind = if script.is_p2pkh() {
        DestinationType::PubkeyHash
    } else if script.is_p2sh() {
        DestinationType::ScriptHash
    } else if script.is_p2wpkh() {
        DestinationType::WitnessV0Keyhash
    } else if script.is_p2wsh() {
        DestinationType::WitnessV0Scripthash
    } else if script.is_p2tr() {
        DestinationType::WitnessV1Taproot
    } else {
        DestinationType::Nonstandard
    };

    let address = match kind {
        DestinationType::Nonstandard => None,
        _ => Address::from_script(script, network).ok(),
    };

    DestinationInfo { kind, address }
}

/// Parses a user-supplied parent-chain address into the script a peg-out
/// should pay to.
pub fn parse_destination(addr: &str, network: Network) -> Result<ScriptBuf, PegoutError> {
    let invalid = || PegoutError::MalformedDestination("Invalid Bitcoin address".to_owned());
    let unchecked: Address<NetworkUnchecked> = addr.trim().parse().map_err(|_| invalid())?;
    let checked = unchecked.require_network(network).map_err(|_| invalid())?;
    Ok(checked.script_pubkey())
}
