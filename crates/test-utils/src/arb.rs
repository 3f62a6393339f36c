use arbitrary::{Arbitrary, Unstructured};
use rand::RngCore;

/// Bytes fed to [`Arbitrary`] per attempt. Plenty for ids and outpoints.
const ENTROPY_LEN: usize = 4096;

/// Random values of any [`Arbitrary`] type, for ids and outpoints that only
/// need to be distinct.
#[derive(Debug)]
pub struct ArbitraryGenerator {
    buf: Vec<u8>,
}

impl Default for ArbitraryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArbitraryGenerator {
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; ENTROPY_LEN],
        }
    }

    pub fn generate<T: for<'a> Arbitrary<'a>>(&mut self) -> T {
        self.generate_with_rng(&mut rand::thread_rng())
    }

    /// Panics if a handful of fresh buffers all fail to produce a `T`.
    pub fn generate_with_rng<T: for<'a> Arbitrary<'a>>(&mut self, rng: &mut impl RngCore) -> T {
        let mut last_err = None;
        for _ in 0..8 {
            rng.fill_bytes(&mut self.buf);
            match T::arbitrary(&mut Unstructured::new(&self.buf)) {
                Ok(value) => return value,
                Err(e) => last_err = Some(e),
            }
        }
        panic!("arbitrary generation kept failing: {last_err:?}");
    }
}
