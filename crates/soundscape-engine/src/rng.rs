//! Deterministic RNG construction.
//!
//! All randomness in a generation call flows through a single PCG32
//! generator created here and threaded through every sampling call; there
//! is no hidden global state. Independent soundscapes get independently seeded
//! generators (see `soundscape_spec::derive_variation_seed`), which is
//! what makes concurrent generation safe.

use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Creates a PCG32 generator from a 32-bit seed.
///
/// The 32-bit seed is widened to 64 bits by mirroring it into both
/// halves, as required by PCG32's state initialization.
pub fn create_rng(seed: u32) -> Pcg32 {
    let seed64 = (seed as u64) | ((seed as u64) << 32);
    Pcg32::seed_from_u64(seed64)
}
