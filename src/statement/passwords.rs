//! Password candidates for encrypted statements.
//!
//! Banks mail statements with predictable filenames and a password derived
//! from the cardholder (national ID, birthday, ...). A filename rule maps a
//! glob over the filename to the password its bank uses.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{BillnoteError, Result};

/// A password candidate, wiped from memory when dropped.
pub type Password = Zeroizing<String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilenameRule {
    #[serde(rename = "name_rule")]
    pub pattern: String,
    /// Informational only; bank detection always runs on the text.
    #[serde(default)]
    pub bank: String,
    pub password: String,
}

/// Translate a glob using `*` and `?` into an anchored regex. Every other
/// character is literal.
pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');
    for c in glob.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }
    out.push('$');
    out
}

pub fn glob_matches(glob: &str, filename: &str) -> bool {
    // (?s) so `*` also spans newlines in odd filenames.
    match Regex::new(&format!("(?s){}", glob_to_regex(glob))) {
        Ok(re) => re.is_match(filename),
        Err(e) => {
            log::warn!("unusable filename rule {glob:?}: {e}");
            false
        }
    }
}

/// Passwords of every rule whose pattern matches `filename`, in rule order.
pub fn rule_passwords(filename: &str, rules: &[FilenameRule]) -> Vec<Password> {
    rules
        .iter()
        .filter(|rule| glob_matches(&rule.pattern, filename))
        .map(|rule| Zeroizing::new(rule.password.clone()))
        .collect()
}

/// Ordered candidates: the owner's stored passwords first, then filename-rule
/// passwords. Empty values and repeats are dropped since the no-password
/// attempt always happens first anyway.
pub fn passwords_for(filename: &str, rules: &[FilenameRule], stored: &[Password]) -> Vec<Password> {
    let mut candidates: Vec<Password> = Vec::new();
    for pw in stored.iter().cloned().chain(rule_passwords(filename, rules)) {
        if !pw.is_empty() && !candidates.contains(&pw) {
            candidates.push(pw);
        }
    }
    candidates
}

pub fn load_rules(path: &Path) -> Result<Vec<FilenameRule>> {
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str(&data)
        .map_err(|e| BillnoteError::InvalidRules(format!("{}: {e}", path.display())))
}
