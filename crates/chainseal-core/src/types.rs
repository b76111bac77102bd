use serde::{Deserialize, Serialize};

/// How a password is stretched into a 256-bit key.
///
/// Block records always use PBKDF2. Off-chain objects default to a single
/// SHA3-256 pass; changing the strength only affects newly written objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyDerivationStrength {
    /// `SHA3-256(password)`, one pass.
    #[default]
    Sha3Single,
    /// PBKDF2-HMAC-SHA256 with a fresh 16-byte salt.
    Pbkdf2,
}

impl std::fmt::Display for KeyDerivationStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha3Single => f.write_str("sha3-single"),
            Self::Pbkdf2 => f.write_str("pbkdf2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        strength: KeyDerivationStrength,
    }

    #[test]
    fn test_parse_kebab_case() {
        let h: Holder = toml::from_str(r#"strength = "pbkdf2""#).unwrap();
        assert_eq!(h.strength, KeyDerivationStrength::Pbkdf2);

        let h: Holder = toml::from_str(r#"strength = "sha3-single""#).unwrap();
        assert_eq!(h.strength, KeyDerivationStrength::Sha3Single);
    }

    #[test]
    fn test_unknown_strength_rejected() {
        let result: Result<Holder, _> = toml::from_str(r#"strength = "md5""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_display_matches_config_spelling() {
        assert_eq!(KeyDerivationStrength::Sha3Single.to_string(), "sha3-single");
        assert_eq!(KeyDerivationStrength::Pbkdf2.to_string(), "pbkdf2");
    }
}
