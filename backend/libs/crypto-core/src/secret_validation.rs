//! Signing secret strength checks
//!
//! HS256 is only as strong as its secret. Start-up code classifies the configured secret
//! and refuses weak ones in production.

const MIN_SECRET_LENGTH: usize = 32;
const RECOMMENDED_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_BYTE: f64 = 3.5;
const MAX_RUN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretStrength {
    Weak,
    Acceptable,
    Strong,
}

/// Classify a signing secret by length, Shannon entropy and obvious runs
pub fn validate_secret_strength(secret: &str) -> SecretStrength {
    let bytes = secret.as_bytes();

    if bytes.len() < MIN_SECRET_LENGTH
        || shannon_entropy(bytes) < MIN_ENTROPY_BITS_PER_BYTE
        || has_runs(bytes)
    {
        return SecretStrength::Weak;
    }

    if bytes.len() >= RECOMMENDED_SECRET_LENGTH {
        SecretStrength::Strong
    } else {
        SecretStrength::Acceptable
    }
}

/// Bits per byte, 0.0..=8.0
fn shannon_entropy(data: &[u8]) -> f64 {
    let mut freq = [0u32; 256];
    for &byte in data {
        freq[byte as usize] += 1;
    }

    let len = data.len() as f64;
    freq.iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Repeated (`aaaa`) or ascending (`1234`) runs of `MAX_RUN` bytes
fn has_runs(data: &[u8]) -> bool {
    let mut same = 1;
    let mut ascending = 1;

    for pair in data.windows(2) {
        same = if pair[0] == pair[1] { same + 1 } else { 1 };
        ascending = if pair[1] as i16 - pair[0] as i16 == 1 {
            ascending + 1
        } else {
            1
        };

        if same >= MAX_RUN || ascending >= MAX_RUN {
            return true;
        }
    }

    false
}
