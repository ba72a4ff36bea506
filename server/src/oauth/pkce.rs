use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{thread_rng, RngCore};
use sha2::{Digest, Sha256};

/// PKCE verifier/challenge pair for the S256 method (RFC 7636).
#[derive(Debug, Clone)]
pub struct PkcePair {
    /// The random secret kept in the session until the callback.
    pub verifier: String,
    /// SHA-256 digest of the verifier, sent on the authorization request.
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh verifier/challenge pair.
    ///
    /// The verifier is drawn from 48 random bytes, base64url encoded and
    /// then stripped of `-` and `_` so only `[A-Za-z0-9]` remains.
    /// Stripping shortens the string, so sampling repeats until the
    /// RFC 7636 length window (43..=128) holds.
    pub fn generate() -> Self {
        let verifier = loop {
            let mut bytes = [0u8; 48];
            thread_rng().fill_bytes(&mut bytes);

            let candidate: String = URL_SAFE_NO_PAD
                .encode(bytes)
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect();
            if (43..=128).contains(&candidate.len()) {
                break candidate;
            }
        };

        let digest = Sha256::digest(verifier.as_bytes());
        let challenge = URL_SAFE_NO_PAD.encode(digest);

        Self {
            verifier,
            challenge,
        }
    }
}

/// Random state token binding the authorization request to the callback.
/// 32 bytes gives 256 bits of entropy.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn challenge_is_digest_of_verifier() {
        let pair = PkcePair::generate();
        let expected = URL_SAFE_NO_PAD.encode(Sha256::digest(pair.verifier.as_bytes()));
        assert_eq!(pair.challenge, expected);
    }

    #[test]
    fn verifier_length_is_within_rfc_window() {
        for _ in 0..100 {
            let pair = PkcePair::generate();
            assert!(
                (43..=128).contains(&pair.verifier.len()),
                "verifier length {} outside 43..=128",
                pair.verifier.len()
            );
        }
    }

    #[test]
    fn verifier_is_alphanumeric_only() {
        let pair = PkcePair::generate();
        assert!(pair.verifier.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn pairs_are_unique() {
        let a = PkcePair::generate();
        let b = PkcePair::generate();
        assert_ne!(a.verifier, b.verifier);
        assert_ne!(a.challenge, b.challenge);
    }

    #[test]
    fn states_are_distinct_across_many_samples() {
        let samples: HashSet<String> = (0..10_000).map(|_| generate_state()).collect();
        assert_eq!(samples.len(), 10_000);
    }
}
