//! Field format rules
//!
//! Shared by observation preparation (which drops unparseable values) and
//! the accuracy validator (which counts rule violations on merged values).

use corpmatch_common::{Error, ResolverSettings};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
        .expect("static email pattern is valid")
});

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 ()\-]+$").expect("static phone pattern is valid"));

/// Compiled format rules
#[derive(Debug, Clone)]
pub struct FieldRules {
    identifier: Regex,
    founding_year_min: i32,
}

impl FieldRules {
    /// Compile rules from resolver settings
    pub fn from_settings(settings: &ResolverSettings) -> Result<Self, Error> {
        let identifier = Regex::new(&settings.identifier_pattern).map_err(|e| {
            Error::Config(format!("identifier_pattern does not compile: {}", e))
        })?;
        Ok(Self {
            identifier,
            founding_year_min: settings.founding_year_min,
        })
    }

    /// Official identifier matches the configured pattern
    pub fn is_valid_identifier(&self, value: &str) -> bool {
        self.identifier.is_match(value)
    }

    /// Founding year within [founding_year_min, current year]
    pub fn is_plausible_founding_year(&self, year: i32) -> bool {
        (self.founding_year_min..=corpmatch_common::time::current_year()).contains(&year)
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// 7-15 digits, optional leading `+`, spaces, dashes and parentheses allowed
pub fn is_valid_phone(value: &str) -> bool {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    PHONE_PATTERN.is_match(value) && (7..=15).contains(&digits)
}

/// http(s) URL whose host contains a dot
pub fn is_valid_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().map(|h| h.contains('.')).unwrap_or(false)
        }
        Err(_) => false,
    }
}
