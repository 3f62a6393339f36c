use bitcoin::Amount;
use fedpeg_primitives::PolicyParams;

use crate::errors::PegoutError;

/// Minimum relay fee rule for peg-out transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeePolicy {
    rate_sat_per_kvb: u64,
}

impl FeePolicy {
    pub fn new(rate_sat_per_kvb: u64) -> Self {
        Self { rate_sat_per_kvb }
    }

    pub fn from_params(params: &PolicyParams) -> Self {
        Self::new(params.fallback_fee_rate_sat_per_kvb)
    }

    pub fn rate_sat_per_kvb(&self) -> u64 {
        self.rate_sat_per_kvb
    }

    /// `ceil(rate * vsize)`, with the rate expressed per vbyte.
    pub fn required_fee(&self, vsize: u64) -> Amount {
        Amount::from_sat(self.rate_sat_per_kvb.saturating_mul(vsize).div_ceil(1000))
    }

    pub fn check_fee(&self, vsize: u64, fee: Amount) -> Result<(), PegoutError> {
        let required = self.required_fee(vsize);
        if fee < required {
            return Err(PegoutError::InsufficientFee { fee, required });
        }
        Ok(())
    }

    pub fn validate_fee(&self, vsize: u64, fee: Amount) -> bool {
        self.check_fee(vsize, fee).is_ok()
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self::from_params(&PolicyParams::default())
    }
}
