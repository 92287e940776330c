use regex::Regex;
use std::sync::LazyLock;

/// URLs with embedded credentials
static URL_WITH_CREDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(https?://)[^:@\s/]+:[^@\s/]+@").expect("static regex is valid")
});

/// Bearer tokens in echoed headers
static BEARER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(bearer\s+)[A-Za-z0-9._~+/=-]+").expect("static regex is valid")
});

/// `key=` query parameters, as used by the Gemini REST API
static KEY_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([?&](?:key|access_token)=)[^&\s]+").expect("static regex is valid")
});

/// Long runs of key-like characters (Google API keys are 39 chars, OAuth
/// access tokens longer)
static POTENTIAL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^A-Za-z0-9_-])[A-Za-z0-9_-]{32,}").expect("static regex is valid")
});

/// Strip credentials from a transport or provider error message before it is
/// printed or logged.
///
/// This is a pattern-based pass and complements, not replaces, the literal
/// [`RedactionSet`](crate::RedactionSet): it catches credentials that leak
/// through library error strings (URLs, echoed headers) even when nobody
/// listed them.
#[must_use]
pub fn redact_error_message(message: &str) -> String {
    let redacted = URL_WITH_CREDS.replace_all(message, "$1[REDACTED]@");
    let redacted = BEARER_TOKEN.replace_all(&redacted, "$1[REDACTED]");
    let redacted = KEY_PARAM.replace_all(&redacted, "$1[REDACTED]");
    let redacted = POTENTIAL_KEY.replace_all(&redacted, "$1[REDACTED_KEY]");
    redacted.into_owned()
}
