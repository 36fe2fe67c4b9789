use std::sync::LazyLock;

use regex::Regex;

use crate::models::FlagReason;

// Seven or more digits, allowing short runs of separators between them
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d(?:[\s\-.()/]{0,2}\d){6,}").expect("phone pattern compiles"));

// Calendar dates and times, which would otherwise read as digit runs
static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:19|20)\d{2}-(?:0?[1-9]|1[0-2])-(?:0?[1-9]|[12]\d|3[01])(?:[T ]\d{1,2}:\d{2}(?::\d{2})?)?\b|\b(?:0?[1-9]|[12]\d|3[01])[./](?:0?[1-9]|1[0-2])[./](?:19|20)\d{2}\b")
        .expect("date pattern compiles")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-z0-9._%+\-]+\s*(?:@|\(at\)|\[at\])\s*[a-z0-9\-]+(?:\.[a-z0-9\-]+)*\.[a-z]{2,}")
        .expect("email pattern compiles")
});

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)\S+|\b[a-z0-9][a-z0-9\-]*\.(?:com|net|org|al|io|me|co)\b")
        .expect("url pattern compiles")
});

static CONTACT_APP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:whats\s?app|viber|telegram|signal|messenger|instagram|call\s+me|text\s+me)\b")
        .expect("contact app pattern compiles")
});

/// Returns the first kind of off-platform contact detail found in `content`,
/// checked in order: phone number, email, URL, contact-app mention.
pub fn detect_contact_sharing(content: &str) -> Option<FlagReason> {
    if PHONE_PATTERN.is_match(&DATE_PATTERN.replace_all(content, " ")) {
        return Some(FlagReason::PhoneNumber);
    }

    let checks: [(&LazyLock<Regex>, FlagReason); 3] = [
        (&EMAIL_PATTERN, FlagReason::Email),
        (&URL_PATTERN, FlagReason::Url),
        (&CONTACT_APP_PATTERN, FlagReason::ContactApp),
    ];

    checks
        .into_iter()
        .find(|(pattern, _)| pattern.is_match(content))
        .map(|(_, reason)| reason)
}
