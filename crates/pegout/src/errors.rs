use bitcoin::Amount;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PegoutError {
    #[error("min relay fee not met, {} < {}", .fee.to_sat(), .required.to_sat())]
    InsufficientFee { fee: Amount, required: Amount },

    #[error("bad-txns-fee-outofrange, fee outputs overflow")]
    FeeOutOfRange,

    #[error("bad-pegout-destination, {0}")]
    MalformedDestination(String),
}
