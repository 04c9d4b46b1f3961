//! Check-in code generation.

use rand::Rng;

/// Generate a random numeric check-in code of exactly `length` digits.
///
/// Codes guard a short-lived, single-activity check-in window, so a
/// thread-local RNG is enough; this is not an authentication secret.
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_has_requested_length() {
        for len in [1usize, 4, 6, 12] {
            assert_eq!(generate_code(len).len(), len);
        }
    }

    #[test]
    fn code_is_numeric() {
        for _ in 0..100 {
            let code = generate_code(6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn code_can_start_with_zero() {
        // With ~10% of codes starting with 0 this terminates quickly.
        let found = (0..1000).any(|_| generate_code(6).starts_with('0'));
        assert!(found, "should be able to generate codes starting with 0");
    }

    #[test]
    fn codes_are_mostly_unique() {
        use std::collections::HashSet;
        let codes: HashSet<String> = (0..100).map(|_| generate_code(6)).collect();
        assert!(codes.len() > 95, "should generate mostly unique codes");
    }
}
