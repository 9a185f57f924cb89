use rand::Rng;
use shuttle_core::BookingReference;

/// Characters used in reference codes. `0`, `O`, `1` and `I` are left out so
/// a code read over the phone cannot be mistyped.
pub const REFERENCE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
pub const REFERENCE_LENGTH: usize = 6;
pub const DEFAULT_PREFIX: &str = "BBE";

/// Produces candidate booking references. The ledger checks uniqueness.
pub trait ReferenceGenerator: Send + Sync {
    fn generate(&self) -> BookingReference;
}

pub struct RandomReferenceGenerator {
    prefix: String,
}

impl RandomReferenceGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim().to_ascii_uppercase(),
        }
    }
}

impl Default for RandomReferenceGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl ReferenceGenerator for RandomReferenceGenerator {
    fn generate(&self) -> BookingReference {
        let mut rng = rand::thread_rng();
        let code: String = (0..REFERENCE_LENGTH)
            .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())] as char)
            .collect();
        BookingReference(format!("{}-{}", self.prefix, code))
    }
}
