use std::sync::LazyLock;

use regex::Regex;

use crate::domain::message::Header;

static LIST_UNSUBSCRIBE_HTTP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(https?://[^>]+)>").expect("valid List-Unsubscribe regex"));

fn values_named<'a>(headers: &'a [Header], name: &'a str) -> impl Iterator<Item = &'a str> {
    headers
        .iter()
        .filter(move |h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Value of the first `From` header, untouched. It is the dedup key, so no
/// trimming or case folding happens here.
pub fn extract_sender(headers: &[Header]) -> Option<String> {
    values_named(headers, "from").next().map(str::to_string)
}

/// First `<http(s)://...>` entry of the first `List-Unsubscribe` header that
/// carries one. `mailto:` entries are skipped.
pub fn extract_unsubscribe_url(headers: &[Header]) -> Option<String> {
    values_named(headers, "list-unsubscribe").find_map(|value| {
        LIST_UNSUBSCRIBE_HTTP
            .captures(value)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}
