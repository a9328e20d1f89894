use crate::Generator;
use rand::Rng;
use snaplink_core::ShortCode;
use typed_builder::TypedBuilder;

/// Default candidate length. The valid configurable range is 6-8.
pub const DEFAULT_LENGTH: usize = 7;

/// Upper and lower case letters plus digits.
pub const DEFAULT_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A generator that samples fixed-alphabet random codes.
///
/// Each call draws `length` characters uniformly from `alphabet` using the
/// thread-local RNG. The alphabet must be non-empty ASCII; codes from the
/// default alphabet always pass [`ShortCode`] validation.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RandomGenerator {
    #[builder(default = DEFAULT_LENGTH)]
    length: usize,
    #[builder(default = DEFAULT_ALPHABET.to_string(), setter(into))]
    alphabet: String,
}

impl RandomGenerator {
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn alphabet(&self) -> &str {
        &self.alphabet
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> ShortCode {
        let alphabet = self.alphabet.as_bytes();
        let mut rng = rand::thread_rng();

        let code: String = (0..self.length)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
            .collect();

        ShortCode::new_unchecked(code)
    }
}
