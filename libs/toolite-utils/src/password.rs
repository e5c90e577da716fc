//! Password strength checks and generation

use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use toolite_common::{Error, Result};
use tracing::warn;

/// Accepted special characters
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?~";

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";

/// Number of required character classes
const CLASS_COUNT: usize = 4;

struct Rules {
    allowed: Regex,
    lower: Regex,
    upper: Regex,
    digit: Regex,
    special: Regex,
}

static RULES: LazyLock<Option<Rules>> = LazyLock::new(|| {
    let special = regex::escape(SPECIAL_CHARS);
    Some(Rules {
        allowed: Regex::new(&format!("^[A-Za-z0-9{}]+$", special)).ok()?,
        lower: Regex::new("[a-z]").ok()?,
        upper: Regex::new("[A-Z]").ok()?,
        digit: Regex::new("[0-9]").ok()?,
        special: Regex::new(&format!("[{}]", special)).ok()?,
    })
});

/// Length bounds for accepted passwords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_len: 8,
            max_len: 16,
        }
    }
}

impl PasswordPolicy {
    pub fn new(min_len: usize, max_len: usize) -> Result<Self> {
        let policy = Self { min_len, max_len };
        policy.validate()?;
        Ok(policy)
    }

    /// Bounds must fit one character of each class and be ordered
    pub fn validate(&self) -> Result<()> {
        if self.min_len < CLASS_COUNT || self.min_len > self.max_len {
            warn!(
                "Rejected password policy: min_len={}, max_len={}",
                self.min_len, self.max_len
            );
            return Err(Error::invalid_input(format!(
                "password length bounds must satisfy {} <= min_len <= max_len, got {}..={}",
                CLASS_COUNT, self.min_len, self.max_len
            )));
        }
        Ok(())
    }

    /// Whether `word` meets this policy
    pub fn check(&self, word: &str) -> bool {
        let Some(rules) = RULES.as_ref() else {
            return false;
        };
        let len = word.chars().count();
        (self.min_len..=self.max_len).contains(&len)
            && rules.allowed.is_match(word)
            && rules.lower.is_match(word)
            && rules.upper.is_match(word)
            && rules.digit.is_match(word)
            && rules.special.is_match(word)
    }

    /// Random password of a length within the policy bounds
    pub fn generate(&self) -> Result<String> {
        self.validate()?;
        let mut rng = rand::thread_rng();
        let len = rng.gen_range(self.min_len..=self.max_len);

        let classes = [LOWER, UPPER, DIGITS, SPECIAL_CHARS].map(|set| set.as_bytes());
        let everything: Vec<u8> = classes.concat();

        let mut chars: Vec<u8> = Vec::with_capacity(len);
        for set in classes {
            chars.extend(set.choose(&mut rng));
        }
        chars.extend((CLASS_COUNT..len).filter_map(|_| everything.choose(&mut rng)));
        chars.shuffle(&mut rng);

        Ok(chars.into_iter().map(char::from).collect())
    }
}

/// 8-16 characters with lowercase, uppercase, digit and special characters,
/// no whitespace
pub fn check_password(word: &str) -> bool {
    PasswordPolicy::default().check(word)
}

/// Random password accepted by [`check_password`]
pub fn generate_password() -> String {
    PasswordPolicy::default().generate().unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_check_password_accepts() {
        assert!(check_password("Abcdef1!"));
        assert!(check_password("Zz9#Zz9#Zz9#Zz9#"));
    }

    #[test]
    fn test_check_password_rejects() {
        // too short / too long
        assert!(!check_password("Ab1!"));
        assert!(!check_password("Abcdefgh12345678!"));
        // missing classes
        assert!(!check_password("abcdefg1!"));
        assert!(!check_password("ABCDEFG1!"));
        assert!(!check_password("Abcdefgh!"));
        assert!(!check_password("Abcdefgh1"));
        // whitespace and characters outside the set
        assert!(!check_password("Abc def1!"));
        assert!(!check_password("Abcdef1!\t"));
        assert!(!check_password("Abcdef1!é"));
    }

    #[test]
    fn test_generated_passwords_pass_check() {
        for _ in 0..200 {
            let word = generate_password();
            assert!(check_password(&word), "generated {:?}", word);
        }
    }

    #[test]
    fn test_custom_policy() {
        let policy = PasswordPolicy::new(12, 20).unwrap();
        assert!(!policy.check("Abcdef1!"));
        assert!(policy.check("Abcdef1!Abcdef"));

        let word = policy.generate().unwrap();
        assert!((12..=20).contains(&word.len()));
        assert!(policy.check(&word));
    }

    #[test]
    #[traced_test]
    fn test_invalid_policy() {
        assert!(PasswordPolicy::new(3, 10).is_err());
        assert!(PasswordPolicy::new(10, 8).is_err());

        let broken = PasswordPolicy {
            min_len: 10,
            max_len: 2,
        };
        assert!(broken.generate().is_err());
        assert!(logs_contain("Rejected password policy"));
    }
}
