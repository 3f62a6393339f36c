use bitcoin::{hashes::Hash, Amount, ScriptBuf, WPubkeyHash};
use fedpeg_primitives::{SidechainTx, SidechainTxIn, SidechainTxOut};

/// Assembles sidechain txs for peg-in tests.
///
/// The claimed value minus the fee goes to a single destination output.
#[derive(Clone, Debug)]
pub struct PeginTxBuilder {
    inputs: Vec<SidechainTxIn>,
    claimed: Amount,
    fee: Amount,
    lock_time: u32,
    destination: ScriptBuf,
}

impl Default for PeginTxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PeginTxBuilder {
    pub fn new() -> Self {
        Self {
            inputs: Vec::new(),
            claimed: Amount::ZERO,
            fee: Amount::from_sat(1_000),
            lock_time: 0,
            destination: ScriptBuf::new_p2wpkh(&WPubkeyHash::from_byte_array([0x22; 20])),
        }
    }

    pub fn claim(mut self, input: SidechainTxIn, value: Amount) -> Self {
        self.inputs.push(input);
        self.claimed += value;
        self
    }

    /// Adds an input without crediting any value.
    pub fn input(mut self, input: SidechainTxIn) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn fee(mut self, fee: Amount) -> Self {
        self.fee = fee;
        self
    }

    /// Distinguishes txs that would otherwise be identical.
    pub fn lock_time(mut self, lock_time: u32) -> Self {
        self.lock_time = lock_time;
        self
    }

    pub fn destination(mut self, destination: ScriptBuf) -> Self {
        self.destination = destination;
        self
    }

    pub fn build(self) -> SidechainTx {
        let payout = self.claimed.checked_sub(self.fee).unwrap_or(Amount::ZERO);
        let outputs = vec![
            SidechainTxOut::new(payout, self.destination.to_bytes()),
            SidechainTxOut::fee(self.fee),
        ];
        let vsize = estimate_vsize(&self.inputs, &outputs);
        SidechainTx {
            inputs: self.inputs,
            outputs,
            lock_time: self.lock_time,
            vsize,
        }
    }
}

/// Rough segwit-style size: base bytes plus witness bytes discounted by four.
fn estimate_vsize(inputs: &[SidechainTxIn], outputs: &[SidechainTxOut]) -> u64 {
    let base = 10 + inputs.len() as u64 * 41
        + outputs
            .iter()
            .map(|o| 9 + o.script_pubkey.len() as u64)
            .sum::<u64>();
    let witness: u64 = inputs
        .iter()
        .flat_map(|i| i.pegin_witness.iter())
        .map(|e| e.len() as u64 + 1)
        .sum();
    base + witness.div_ceil(4)
}
