use std::sync::LazyLock;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use log::debug;
use regex::Regex;

use crate::error::{Error, Result};

/// Gmail hands back `raw` as base64url; padding is not guaranteed.
const RAW_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

static UNSUBSCRIBE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"]*unsubscribe[^\s"]*"#).expect("valid unsubscribe link regex")
});

/// Decode a `format=raw` blob into the RFC 822 bytes of the message.
pub fn decode_raw_message(raw: &str) -> Result<Vec<u8>> {
    let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    RAW_ENGINE
        .decode(compact.as_bytes())
        .map_err(|e| Error::Decode(format!("raw message is not base64url: {e}")))
}

/// First URL containing "unsubscribe" (any case), bounded by whitespace or `"`.
pub fn find_unsubscribe_link(text: &str) -> Option<String> {
    UNSUBSCRIBE_LINK.find(text).map(|m| m.as_str().to_string())
}

/// UTF-8 text with invalid byte sequences dropped, not replaced.
fn utf8_ignoring_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|c| c.valid()).collect()
}

/// Look for an unsubscribe link in a whole RFC 822 message.
///
/// The message is first scanned as stored, as UTF-8 with invalid bytes
/// dropped. Only if that finds nothing are the MIME text parts decoded (quoted-printable
/// soft breaks and base64 parts would otherwise hide the link) and scanned.
pub fn scan_raw_message(raw_rfc822: &[u8]) -> Option<String> {
    let text = utf8_ignoring_invalid(raw_rfc822);
    if let Some(link) = find_unsubscribe_link(&text) {
        return Some(link);
    }

    match mailparse::parse_mail(raw_rfc822) {
        Ok(parsed) => find_in_text_parts(&parsed),
        Err(e) => {
            debug!("MIME parse failed, raw scan only: {e}");
            None
        }
    }
}

fn find_in_text_parts(p: &mailparse::ParsedMail) -> Option<String> {
    if p.subparts.is_empty() {
        let mime = p.ctype.mimetype.to_ascii_lowercase();
        if !mime.starts_with("text/") {
            return None;
        }
        return p.get_body().ok().and_then(|b| find_unsubscribe_link(&b));
    }

    p.subparts.iter().find_map(find_in_text_parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};

    #[test]
    fn finds_link_inside_prose() {
        let body = "...see http://ex.com/unsubscribe?id=5 now...";
        assert_eq!(
            find_unsubscribe_link(body).as_deref(),
            Some("http://ex.com/unsubscribe?id=5")
        );
    }

    #[test]
    fn link_match_is_case_insensitive_and_stops_at_quote() {
        let body = r#"<a href="HTTPS://Shop.com/prefs/UnSubscribe/42">Leave</a>"#;
        assert_eq!(
            find_unsubscribe_link(body).as_deref(),
            Some("HTTPS://Shop.com/prefs/UnSubscribe/42")
        );
    }

    #[test]
    fn returns_first_of_several_links() {
        let body = "http://a.com/home http://a.com/unsubscribe/1 https://b.com/unsubscribe/2";
        assert_eq!(
            find_unsubscribe_link(body).as_deref(),
            Some("http://a.com/unsubscribe/1")
        );
    }

    #[test]
    fn no_link_without_token() {
        assert_eq!(find_unsubscribe_link("visit http://a.com/prefs today"), None);
        assert_eq!(find_unsubscribe_link("unsubscribe by replying"), None);
    }

    #[test]
    fn decodes_padded_and_unpadded_raw() {
        let msg = b"From: a@b.com\r\n\r\nhello?>";
        let padded = URL_SAFE.encode(msg);
        let unpadded = URL_SAFE_NO_PAD.encode(msg);
        assert_eq!(decode_raw_message(&padded).unwrap(), msg);
        assert_eq!(decode_raw_message(&unpadded).unwrap(), msg);
    }

    #[test]
    fn rejects_garbage_raw() {
        assert!(matches!(
            decode_raw_message("not*base64!"),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn scan_ignores_invalid_utf8() {
        let mut msg = b"From: a@b.com\r\n\r\n\xff\xfe ".to_vec();
        msg.extend_from_slice(b"http://b/unsubscribe");
        assert_eq!(scan_raw_message(&msg).as_deref(), Some("http://b/unsubscribe"));
    }

    #[test]
    fn invalid_bytes_inside_link_are_dropped() {
        let msg = b"see http://x.com/\xffunsubscribe?id=1 now";
        assert_eq!(
            scan_raw_message(msg).as_deref(),
            Some("http://x.com/unsubscribe?id=1")
        );
        assert_eq!(utf8_ignoring_invalid(b"a\xe9b\xc3\xa9"), "ab\u{e9}");
    }

    #[test]
    fn scan_falls_back_to_decoded_parts() {
        let link = "https://news.example.com/unsubscribe?u=99";
        let encoded = STANDARD.encode(format!("Bye: {link}\n"));
        let msg = format!(
            "From: News <news@example.com>\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             Content-Transfer-Encoding: base64\r\n\r\n{encoded}\r\n"
        );
        assert_eq!(scan_raw_message(msg.as_bytes()).as_deref(), Some(link));
    }

    #[test]
    fn scan_handles_quoted_printable_soft_breaks() {
        let msg = "From: a@b.com\r\n\
                   Content-Type: text/plain\r\n\
                   Content-Transfer-Encoding: quoted-printable\r\n\r\n\
                   Leave: https://b.com/unsub=\r\nscribe?x=1\r\n";
        assert_eq!(
            scan_raw_message(msg.as_bytes()).as_deref(),
            Some("https://b.com/unsubscribe?x=1")
        );
    }
}
