//! Name and website normalization
//!
//! Both functions are pure and deterministic. Normalized names feed the
//! similarity scorer; normalized hosts key the domain index.

use url::Url;

/// Legal-entity suffixes, as token sequences after punctuation folding
///
/// Because punctuation becomes whitespace before suffix matching, dotted
/// spellings ("Pte. Ltd.", "L.L.C.") need no separate entries.
const LEGAL_SUFFIXES: &[&[&str]] = &[
    &["pte", "ltd"],
    &["private", "limited"],
    &["sdn", "bhd"],
    &["l", "l", "c"],
    &["l", "l", "p"],
    &["ltd"],
    &["limited"],
    &["inc"],
    &["incorporated"],
    &["corp"],
    &["corporation"],
    &["llc"],
    &["llp"],
    &["co"],
    &["company"],
];

/// Canonicalize a raw company name for comparison
///
/// Lower-cases, turns every punctuation or symbol character into a space,
/// collapses whitespace and strips trailing legal suffixes until none
/// remains. The last token is never stripped, so "Limited" alone stays
/// "limited". Idempotent: `normalize_name(&normalize_name(x)) == normalize_name(x)`.
///
/// # Example
/// ```
/// use corpmatch_resolve::normalize::normalize_name;
///
/// assert_eq!(normalize_name("TechCorp Solutions Pte. Ltd."), "techcorp solutions");
/// assert_eq!(normalize_name("   "), "");
/// ```
pub fn normalize_name(raw: &str) -> String {
    let folded: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = folded.split_whitespace().collect();

    loop {
        let suffix = LEGAL_SUFFIXES
            .iter()
            .find(|suffix| suffix.len() < tokens.len() && tokens.ends_with(suffix));
        match suffix {
            Some(suffix) => tokens.truncate(tokens.len() - suffix.len()),
            None => break,
        }
    }

    tokens.join(" ")
}

/// Extract the comparable host of a website URL
///
/// Lower-cases the host and strips one leading `www.` label. Values without
/// a scheme are treated as `https://`. Returns `None` when no host can be
/// parsed.
pub fn normalize_domain(website: &str) -> Option<String> {
    let trimmed = website.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = if trimmed.contains("://") {
        Url::parse(trimmed).ok()?
    } else {
        Url::parse(&format!("https://{}", trimmed)).ok()?
    };

    let host = parsed.host_str()?.trim_end_matches('.').to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}
