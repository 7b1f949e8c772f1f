use crate::error::{AppError, AppResult};
use crate::registry::Registry;

/// Character set for generating short codes.
const ALPHABET_CHARS: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M',
    'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Service for generating unique short codes.
///
/// Statistical uniqueness over the 62^length codespace is sufficient here;
/// codes are identifiers, not security tokens. Exhausting the retry budget
/// is a theoretical rather than practical risk while the codespace dwarfs
/// the registry, but the budget keeps a pathological registry from turning
/// the loop into a livelock.
pub struct ShortCodeService;

impl ShortCodeService {
    /// Produce one random candidate code of the given length.
    pub fn random_code(length: usize) -> String {
        nanoid::nanoid!(length, ALPHABET_CHARS)
    }

    /// Generate a short code that is absent from the registry at probe time.
    ///
    /// Resamples up to `max_attempts` times; exhaustion returns
    /// `AppError::CapacityExhausted`. The registry's atomic insert remains
    /// the final arbiter against probe-to-insert races.
    pub async fn generate_short_code(
        length: usize,
        max_attempts: u32,
        registry: &dyn Registry,
    ) -> AppResult<String> {
        for _ in 0..max_attempts {
            let code = Self::random_code(length);

            if !registry.exists(&code).await? {
                return Ok(code);
            }
        }

        Err(AppError::CapacityExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryRegistry;

    #[test]
    fn test_alphabet_chars_const() {
        // Verify the alphabet has 62 characters (0-9, A-Z, a-z)
        assert_eq!(ALPHABET_CHARS.len(), 62);
    }

    #[test]
    fn test_alphabet_chars_unique() {
        // Verify all characters are unique
        let unique: std::collections::HashSet<_> = ALPHABET_CHARS.iter().collect();
        assert_eq!(unique.len(), ALPHABET_CHARS.len());
    }

    #[test]
    fn test_random_code_shape() {
        let code = ShortCodeService::random_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_generate_against_empty_registry() {
        let registry = InMemoryRegistry::new();
        let code = ShortCodeService::generate_short_code(6, 10, &registry)
            .await
            .unwrap();
        assert_eq!(code.len(), 6);
    }
}
