//! Fixtures shared by the peg crates' tests.

mod arb;
pub mod deposit;
pub mod federation;
pub mod parent_chain;
pub mod pegin;

pub use arb::ArbitraryGenerator;
pub use deposit::Deposit;
pub use federation::PegFixture;
pub use parent_chain::FakeParentChain;
pub use pegin::PeginTxBuilder;
