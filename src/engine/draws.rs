//! Uniform draws used by the resolver and the drive machine.
//!
//! Every random decision in an advance call is one uniform `f64` in `[0, 1)`
//! pulled from an injected [`Rng`]. Index picks use `floor(u * n)`, so a list
//! of draws fully determines a call and can be replayed with [`ReplayDraws`].

use rand::{Error, Rng, RngCore};

/// One uniform draw in `[0, 1)`.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>()
}

/// Uniform index into a collection of `len` items. `len` must be non-zero.
pub fn index<R: Rng + ?Sized>(rng: &mut R, len: usize) -> usize {
    let i = (uniform(rng) * len as f64).floor() as usize;
    i.min(len - 1)
}

/// Largest `f64` strictly below 1 that survives the 53-bit round trip.
const MAX_DRAW: f64 = 1.0 - 1.0 / (1u64 << 53) as f64;

/// Replays a fixed sequence of uniform draws, cycling when exhausted.
///
/// Values are encoded so that `rng.gen::<f64>()` returns them exactly (to
/// 53 bits); out-of-range values are clamped into `[0, 1)`.
#[derive(Debug, Clone)]
pub struct ReplayDraws {
    draws: Vec<f64>,
    next: usize,
}

impl ReplayDraws {
    pub fn new(draws: impl Into<Vec<f64>>) -> Self {
        Self { draws: draws.into(), next: 0 }
    }

    /// How many draws have been consumed so far.
    pub fn consumed(&self) -> usize {
        self.next
    }
}

impl RngCore for ReplayDraws {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        if self.draws.is_empty() {
            return 0;
        }
        let u = self.draws[self.next % self.draws.len()].clamp(0.0, MAX_DRAW);
        self.next += 1;
        ((u * (1u64 << 53) as f64) as u64) << 11
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
