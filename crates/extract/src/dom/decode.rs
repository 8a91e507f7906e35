// ABOUTME: Decodes raw page bytes into text before parsing.
// ABOUTME: Uses the charset from a Content-Type value when present, otherwise chardetng detection.

/// Decode page bytes to a String using the charset from `content_type` or detection.
pub fn decode_html(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract the charset value from a Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        if let Some(charset) = part.trim().strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_with_header() {
        let body = "Nutzfläche".as_bytes();
        assert_eq!(
            decode_html(body, Some("text/html; charset=UTF-8")),
            "Nutzfläche"
        );
    }

    #[test]
    fn latin1_with_header() {
        let body = b"Nutzfl\xe4che";
        assert_eq!(
            decode_html(body, Some("text/html; charset=\"iso-8859-1\"")),
            "Nutzfläche"
        );
    }

    #[test]
    fn detects_without_header() {
        let body = "<p>Büro – Zürich</p>".as_bytes();
        assert_eq!(decode_html(body, None), "<p>Büro – Zürich</p>");
    }

    #[test]
    fn charset_parsing() {
        assert_eq!(
            extract_charset("text/html;charset=windows-1252"),
            Some("windows-1252".to_string())
        );
        assert_eq!(extract_charset("text/html"), None);
    }
}
