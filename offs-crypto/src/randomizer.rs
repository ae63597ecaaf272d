use rand::{rngs::OsRng, RngCore};

/// A source of cryptographically secure random bytes.
///
/// Abstracted behind a trait so that ingestion tests can swap in a seeded
/// generator (for deterministic fixtures) without touching the engine code
/// that consumes it. Padding bytes must never be zero-filled (§4.6) — the
/// default implementation always draws from the OS CSPRNG.
pub trait RandomizerSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]);

    fn generate(&self, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        self.fill(&mut buf);
        buf
    }
}

/// Default randomizer backed by the operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandomizer;

impl RandomizerSource for OsRandomizer {
    fn fill(&self, buf: &mut [u8]) {
        OsRng.fill_bytes(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_has_requested_length() {
        let rng = OsRandomizer;
        assert_eq!(rng.generate(128).len(), 128);
    }

    #[test]
    fn generate_is_not_all_zero() {
        let rng = OsRandomizer;
        let buf = rng.generate(256);
        assert!(buf.iter().any(|&b| b != 0));
    }
}
