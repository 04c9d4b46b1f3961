use std::env;

use tracing::warn;

/// Runtime configuration, read once at startup from the environment
/// (a `.env` file is loaded by main before this runs).
#[derive(Clone, Debug)]
pub struct Config {
    /// How long a generated check-in code stays valid.
    pub otp_validity_minutes: u64,
    /// Number of decimal digits in a generated code.
    pub otp_code_length: usize,
    /// How long a passed verification keeps the participation form open.
    pub gate_validity_minutes: u64,
    /// Base URL of the external auth service the login page talks to.
    pub auth_api_url: String,
    /// Directory where participant photo uploads land.
    pub media_root: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            otp_validity_minutes: parse_or("OTP_VALIDITY_MINUTES", 180),
            otp_code_length: parse_or("OTP_CODE_LENGTH", 6),
            gate_validity_minutes: parse_or("GATE_VALIDITY_MINUTES", 180),
            auth_api_url: env::var("AUTH_API_URL")
                .unwrap_or_else(|_| "http://auth.localhost:8080".to_string()),
            media_root: env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()),
        }
    }
}

fn parse_or<T: std::str::FromStr + PartialOrd + From<u8> + Copy + std::fmt::Display>(
    key: &str,
    default: T,
) -> T {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    match raw.parse::<T>() {
        // Zero-length codes and zero-minute windows are misconfigurations,
        // not valid settings.
        Ok(v) if v > T::from(0u8) => v,
        _ => {
            warn!("Invalid {} value {:?}, using default {}", key, raw, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        // Guard against collisions with other tests mutating the env.
        env::remove_var("OTP_VALIDITY_MINUTES_TEST_ONLY");
        assert_eq!(parse_or("OTP_VALIDITY_MINUTES_TEST_ONLY", 180u64), 180);
    }

    #[test]
    fn zero_falls_back_to_default() {
        env::set_var("OTP_CODE_LENGTH_TEST_ONLY", "0");
        assert_eq!(parse_or("OTP_CODE_LENGTH_TEST_ONLY", 6usize), 6);
        env::remove_var("OTP_CODE_LENGTH_TEST_ONLY");
    }

    #[test]
    fn garbage_falls_back_to_default() {
        env::set_var("GATE_VALIDITY_MINUTES_TEST_ONLY", "soon");
        assert_eq!(parse_or("GATE_VALIDITY_MINUTES_TEST_ONLY", 180u64), 180);
        env::remove_var("GATE_VALIDITY_MINUTES_TEST_ONLY");
    }
}
