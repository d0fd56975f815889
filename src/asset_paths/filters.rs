use regex::Regex;

fn external_reference_patterns() -> &'static [Regex] {
    use std::sync::OnceLock;

    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            vec![
                Regex::new(r"(?i)^https?://").expect("invalid http(s) regex"),
                Regex::new(r"^//").expect("invalid protocol-relative regex"),
                Regex::new(r"(?i)^data:").expect("invalid data URI regex"),
            ]
        })
        .as_slice()
}

/// Determine whether a module path points outside the application.
///
/// External bundles are linked as-is and never contribute a static directory.
pub fn is_url(value: &str) -> bool {
    external_reference_patterns()
        .iter()
        .any(|pattern| pattern.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::is_url;

    #[test]
    fn detects_http_urls() {
        assert!(is_url("https://cdn.example.com/jquery.js"));
        assert!(is_url("HTTP://example.com"));
    }

    #[test]
    fn detects_protocol_relative_urls() {
        assert!(is_url("//cdn.example.com/jquery.js"));
    }

    #[test]
    fn detects_data_uris() {
        assert!(is_url("data:text/javascript;base64,abc"));
    }

    #[test]
    fn keeps_application_paths() {
        assert!(!is_url("~/scripts/app"));
        assert!(!is_url("/scripts/app"));
        assert!(!is_url("scripts/http/app"));
    }
}
