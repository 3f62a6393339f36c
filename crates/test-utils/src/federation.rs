//! Federation keys and a ready-made peg setup on top of [`FakeParentChain`].

use bitcoin::{
    opcodes::all::OP_CHECKMULTISIG,
    script::Builder,
    Amount, Network, Script, ScriptBuf, Transaction, TxOut,
};
use fedpeg_claim_script::ClaimScriptDeriver;
use fedpeg_primitives::{DepositScriptType, PegParams, PolicyParams, SidechainTx};
use secp256k1::{PublicKey, SecretKey, SECP256K1};

use crate::{
    deposit::Deposit,
    parent_chain::{coinbase_tx, spend_tx, FakeParentChain},
    pegin::PeginTxBuilder,
};

/// 1-of-1 federation script used by the reference regtest setup.
pub const FEDPEG_SCRIPT_HEX: &str =
    "512103dff4923d778550cc13ce0d887d737553b4b58f4e8e886507fc39f5e447b2186451ae";

pub fn fedpeg_script() -> ScriptBuf {
    ScriptBuf::from_bytes(hex::decode(FEDPEG_SCRIPT_HEX).expect("valid hex"))
}

fn key_from(tag: u8, i: u8) -> PublicKey {
    let mut sk = [tag; 32];
    sk[31] = i;
    SecretKey::from_slice(&sk)
        .expect("in range")
        .public_key(SECP256K1)
}

pub fn federation_key(i: u8) -> PublicKey {
    key_from(0x01, i)
}

/// `threshold`-of-`n` CHECKMULTISIG over deterministic keys.
pub fn multisig_fedpeg_script(threshold: u8, n: u8) -> ScriptBuf {
    let mut builder = Builder::new().push_int(threshold as i64);
    for i in 0..n {
        builder = builder.push_key(&bitcoin::PublicKey::new(federation_key(i)));
    }
    builder
        .push_int(n as i64)
        .push_opcode(OP_CHECKMULTISIG)
        .into_script()
}

/// A wallet-side claim script, here a P2WPKH picked by `seed`.
pub fn claim_script(seed: u8) -> ScriptBuf {
    let pk = key_from(0x02, seed);
    ScriptBuf::new_p2wpkh(&bitcoin::PublicKey::new(pk).wpubkey_hash().expect("compressed"))
}

/// Parent chain, peg parameters and deriver wired together.
#[derive(Debug)]
pub struct PegFixture {
    pub chain: FakeParentChain,
    pub params: PegParams,
    pub deriver: ClaimScriptDeriver,
}

impl Default for PegFixture {
    fn default() -> Self {
        Self::new(DepositScriptType::P2shP2wsh)
    }
}

impl PegFixture {
    pub fn new(script_type: DepositScriptType) -> Self {
        Self::with_policy(script_type, PolicyParams::default())
    }

    pub fn with_policy(script_type: DepositScriptType, policy: PolicyParams) -> Self {
        let chain = FakeParentChain::new();
        let params = PegParams {
            parent_network: Network::Regtest,
            parent_genesis_hash: chain.genesis_hash(),
            fedpeg_script: fedpeg_script(),
            deposit_script_type: script_type,
            policy,
        };
        let deriver = ClaimScriptDeriver::new(params.fedpeg_script.clone(), script_type)
            .expect("fixture script has keys");
        Self {
            chain,
            params,
            deriver,
        }
    }

    pub fn deposit_output(&self, claim_script: &Script, value: Amount) -> TxOut {
        TxOut {
            value,
            script_pubkey: self
                .deriver
                .deposit_script(claim_script)
                .expect("derivable"),
        }
    }

    /// Mines a deposit of `value` to `claim_script` at output 1, behind an
    /// unrelated output. It has one confirmation afterwards.
    pub fn deposit(&mut self, claim_script: &Script, value: Amount, seed: u8) -> Deposit {
        let change = TxOut {
            value: Amount::from_sat(12_345),
            script_pubkey: ScriptBuf::new_op_return([seed]),
        };
        let tx = spend_tx(seed, vec![change, self.deposit_output(claim_script, value)]);
        self.mine_deposit(tx, 1, claim_script)
    }

    /// Mines a block whose coinbase pays `value` to `claim_script`.
    pub fn coinbase_deposit(&mut self, claim_script: &Script, value: Amount) -> Deposit {
        let height = self.chain.tip().height() + 1;
        let tx = coinbase_tx(height, vec![self.deposit_output(claim_script, value)]);
        self.mine_deposit(tx, 0, claim_script)
    }

    fn mine_deposit(&mut self, tx: Transaction, vout: u32, claim_script: &Script) -> Deposit {
        let header = self.chain.mine_block(&[tx.clone()]);
        Deposit {
            tx,
            vout,
            claim_script: claim_script.to_owned(),
            block_hash: header.hash(),
            height: header.height(),
        }
    }

    pub fn confirmations(&self, deposit: &Deposit) -> u64 {
        (self.chain.tip().height() + 1).saturating_sub(deposit.height)
    }

    /// Mines empty blocks until `deposit` has `confs` confirmations.
    pub fn confirm_to(&mut self, deposit: &Deposit, confs: u64) {
        let have = self.confirmations(deposit);
        self.chain.mine_empty(confs.saturating_sub(have));
    }

    /// A tx claiming `deposits`, proofs taken from the current chain.
    pub fn pegin_tx(&self, deposits: &[&Deposit], lock_time: u32) -> SidechainTx {
        let mut builder = PeginTxBuilder::new().lock_time(lock_time);
        for d in deposits {
            let proof = self
                .chain
                .proof_for(d.tx.compute_txid())
                .expect("deposit on best chain");
            let witness = d.witness(self.params.parent_genesis_hash, proof);
            builder = builder.claim(d.input(&witness), d.value());
        }
        builder.build()
    }
}
