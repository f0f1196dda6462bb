use ark_std::marker::PhantomData;
use ark_std::rand::{CryptoRng, Rng, RngCore, SeedableRng};
use ark_std::UniformRand;
use blake2::Blake2s256;
use digest::{Digest, Output};
use rand_chacha::ChaChaRng;

/// Sample a vector of random elements of type T
pub fn sample_vector<T: UniformRand, R: Rng>(seed: &mut R, length: usize) -> Vec<T> {
    (0..length).map(|_| T::rand(seed)).collect::<Vec<_>>()
}

/// Reproducible randomness derived from a human readable label.
///
/// Every player in a simulated table can be given its own stream by forking a
/// table-wide rng with the player's address, so that a whole deal replays
/// identically from a single seed.
pub struct SeededRng<D: Digest> {
    r: ChaChaRng,
    seed: Output<D>,
    #[doc(hidden)]
    digest: PhantomData<D>,
}

/// The seeded rng used across the workspace.
pub type LabeledRng = SeededRng<Blake2s256>;

impl<D: Digest> RngCore for SeededRng<D> {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.r.next_u32()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.r.next_u64()
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.r.fill_bytes(dest);
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), ark_std::rand::Error> {
        self.r.try_fill_bytes(dest)
    }
}

impl<D: Digest> CryptoRng for SeededRng<D> {}

impl<D: Digest> SeededRng<D> {
    /// Create a new `Self` with `self.seed = H(label)`.
    pub fn from_label(label: &[u8]) -> Self {
        let seed = D::digest(label);
        Self {
            r: chacha_from(&seed),
            seed,
            digest: PhantomData,
        }
    }

    /// Derive an independent stream with `seed = H(self.seed || label)`.
    /// The parent stream is left untouched.
    pub fn fork(&self, label: &[u8]) -> Self {
        let seed = D::new()
            .chain_update(&self.seed)
            .chain_update(label)
            .finalize();
        Self {
            r: chacha_from(&seed),
            seed,
            digest: PhantomData,
        }
    }
}

// Digests shorter than 32 bytes are zero padded.
fn chacha_from(seed: &[u8]) -> ChaChaRng {
    let mut r_seed = [0u8; 32];
    let n = seed.len().min(r_seed.len());
    r_seed[..n].copy_from_slice(&seed[..n]);
    ChaChaRng::from_seed(r_seed)
}
