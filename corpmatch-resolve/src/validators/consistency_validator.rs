//! Consistency Validator
//!
//! Cross-field logical checks on a merged entity.
//!
//! # Consistency Checks
//! 1. **Industry evidence**: the declared industry must be supported by the
//!    services, products or keywords text whenever that text points at any
//!    known industry
//! 2. **Size class**: the employee-count bucket (<50 Small, <250 Medium,
//!    otherwise Large) must agree with the declared company size
//! 3. **Website host**: the website must not be a social-media platform page
//!
//! # Scoring
//! consistency = 100 − 10 × violations, floored at 0.

use super::{EntityValidator, SubScore};
use crate::normalize::normalize_domain;
use crate::types::{FieldMap, FieldName};

const PENALTY_PER_VIOLATION: f32 = 10.0;

/// Industry label → whole-word evidence terms
const INDUSTRY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Technology",
        &["software", "tech", "technology", "digital", "computer", "programming", "cyber", "ai", "artificial intelligence", "cloud", "saas"],
    ),
    (
        "Finance",
        &["bank", "banking", "finance", "financial", "investment", "insurance", "fund", "capital", "loan", "credit"],
    ),
    (
        "Healthcare",
        &["health", "healthcare", "medical", "hospital", "clinic", "pharmaceutical", "drug", "medicine", "therapy"],
    ),
    (
        "Manufacturing",
        &["manufacturing", "factory", "production", "industrial", "machinery", "equipment", "assembly"],
    ),
    (
        "Retail",
        &["retail", "shop", "store", "commerce", "ecommerce", "merchandise", "goods"],
    ),
    (
        "Education",
        &["education", "school", "university", "training", "learning", "academic", "teaching", "course"],
    ),
    (
        "Real Estate",
        &["real estate", "property", "housing", "land", "leasing"],
    ),
    (
        "Transportation",
        &["transport", "logistics", "shipping", "delivery", "freight", "cargo", "aviation", "maritime"],
    ),
    (
        "Food & Beverage",
        &["food", "restaurant", "catering", "beverage", "dining", "culinary", "cafe"],
    ),
    (
        "Professional Services",
        &["consulting", "consultancy", "advisory", "legal", "accounting", "audit"],
    ),
    (
        "Construction",
        &["construction", "contractor", "building", "civil engineering", "infrastructure"],
    ),
    (
        "Media & Entertainment",
        &["media", "entertainment", "advertising", "marketing", "creative", "agency"],
    ),
    (
        "Energy",
        &["energy", "oil", "gas", "renewable", "solar", "power", "utility", "electricity"],
    ),
    (
        "Telecommunications",
        &["telecom", "telecommunications", "mobile", "network", "broadband"],
    ),
];

const SOCIAL_PLATFORM_HOSTS: &[&str] = &[
    "facebook.com",
    "linkedin.com",
    "instagram.com",
    "twitter.com",
    "x.com",
];

pub struct ConsistencyValidator;

impl ConsistencyValidator {
    pub fn new() -> Self {
        Self
    }

    /// Violation message, if the declared industry lacks evidence
    fn check_industry(&self, fields: &FieldMap) -> Option<String> {
        let declared = fields.get(&FieldName::Industry)?;
        let (label, terms) = INDUSTRY_KEYWORDS
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(declared.trim()))?;

        let text = evidence_text(fields)?;
        if has_evidence(&text, terms) {
            return None;
        }

        let supported: Vec<&str> = INDUSTRY_KEYWORDS
            .iter()
            .filter(|(_, terms)| has_evidence(&text, terms))
            .map(|(label, _)| *label)
            .collect();
        if supported.is_empty() {
            return None;
        }

        Some(format!(
            "Industry '{}' not supported by keyword evidence (text suggests {})",
            label,
            supported.join(", ")
        ))
    }

    fn check_size_class(&self, fields: &FieldMap) -> Option<String> {
        let declared = fields.get(&FieldName::CompanySize)?;
        if declared == "Unknown" {
            return None;
        }
        let count: u64 = fields.get(&FieldName::EmployeeCount)?.parse().ok()?;
        let bucket = size_bucket(count);
        if bucket.eq_ignore_ascii_case(declared) {
            None
        } else {
            Some(format!(
                "Company size '{}' contradicts employee count {} ({})",
                declared, count, bucket
            ))
        }
    }

    fn check_website_host(&self, fields: &FieldMap) -> Option<String> {
        let host = normalize_domain(fields.get(&FieldName::Website)?)?;
        let platform = SOCIAL_PLATFORM_HOSTS
            .iter()
            .find(|p| host == **p || host.ends_with(&format!(".{}", p)))?;
        Some(format!("Website is a {} page, not a company site", platform))
    }
}

impl Default for ConsistencyValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityValidator for ConsistencyValidator {
    fn name(&self) -> &'static str {
        "consistency"
    }

    fn validate(&self, fields: &FieldMap) -> SubScore {
        let issues: Vec<String> = [
            self.check_industry(fields),
            self.check_size_class(fields),
            self.check_website_host(fields),
        ]
        .into_iter()
        .flatten()
        .collect();

        let score = (100.0 - PENALTY_PER_VIOLATION * issues.len() as f32).max(0.0);
        SubScore { score, issues }
    }
}

/// Employee-count size class
pub fn size_bucket(employee_count: u64) -> &'static str {
    match employee_count {
        0..=49 => "Small",
        50..=249 => "Medium",
        _ => "Large",
    }
}

/// Lower-cased, punctuation-folded evidence text padded with spaces
fn evidence_text(fields: &FieldMap) -> Option<String> {
    let joined: Vec<&str> = [
        FieldName::ServicesOffered,
        FieldName::ProductsOffered,
        FieldName::Keywords,
    ]
    .iter()
    .filter_map(|f| fields.get(f).map(String::as_str))
    .collect();
    if joined.is_empty() {
        return None;
    }

    let folded: String = joined
        .join(" ")
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let words: Vec<&str> = folded.split_whitespace().collect();
    Some(format!(" {} ", words.join(" ")))
}

fn has_evidence(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| text.contains(&format!(" {} ", term)))
}
