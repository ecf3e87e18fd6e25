//! Denylist text sanitizer
//!
//! Advisory only. This strips a handful of obvious markup and script
//! fragments; it does not parse HTML and will not stop encoded or obfuscated
//! payloads. Anything that feeds a trust decision needs an allowlist encoder
//! on the server side.

use regex::Regex;

/// Strips angle brackets, `javascript:` schemes and inline `on*=` handlers
pub struct Sanitizer {
    max_length: usize,
    javascript_scheme: Regex,
    event_handler: Regex,
}

impl Sanitizer {
    /// Create a sanitizer that keeps at most `max_length` characters
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            javascript_scheme: Regex::new(r"(?i)javascript:").expect("valid regex"),
            event_handler: Regex::new(r"(?i)on\w+=").expect("valid regex"),
        }
    }

    /// Max characters kept
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Sanitize a raw field value
    pub fn sanitize(&self, raw: &str) -> String {
        let mut text = raw.to_string();

        // Each removal can splice a new match together ("javajavascript:script:"),
        // so run until nothing changes. Every pass that changes anything shrinks
        // the string, which bounds the loop.
        loop {
            let next: String = text.chars().filter(|c| *c != '<' && *c != '>').collect();
            let next = self.javascript_scheme.replace_all(&next, "");
            let next = self.event_handler.replace_all(&next, "").into_owned();
            if next == text {
                break;
            }
            text = next;
        }

        let trimmed = text.trim();
        match trimmed.char_indices().nth(self.max_length) {
            Some((idx, _)) => trimmed[..idx].to_string(),
            None => trimmed.to_string(),
        }
    }

    /// Sanitize an optional value; a missing value becomes the empty string
    pub fn sanitize_opt(&self, raw: Option<&str>) -> String {
        raw.map(|r| self.sanitize(r)).unwrap_or_default()
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_clean(sanitizer: &Sanitizer, out: &str) {
        assert!(!out.contains('<'), "{out:?} contains <");
        assert!(!out.contains('>'), "{out:?} contains >");
        assert!(!sanitizer.javascript_scheme.is_match(out), "{out:?} contains javascript:");
        assert!(!sanitizer.event_handler.is_match(out), "{out:?} contains on*=");
        assert!(out.chars().count() <= sanitizer.max_length());
    }

    #[test]
    fn test_strips_markup() {
        let s = Sanitizer::default();
        assert_eq!(s.sanitize("<b>bread</b>"), "bbread/b");
        assert_eq!(s.sanitize("  JavaScript:alert(1) "), "alert(1)");
        assert_eq!(s.sanitize("img onerror=boom"), "img boom");
        assert_eq!(s.sanitize("ONLOAD=x"), "x");
    }

    #[test]
    fn test_plain_text_untouched() {
        let s = Sanitizer::default();
        assert_eq!(s.sanitize("I need food for my family"), "I need food for my family");
        assert_eq!(s.sanitize("O'Brien-Smith"), "O'Brien-Smith");
    }

    #[test]
    fn test_spliced_payloads() {
        let s = Sanitizer::default();
        let inputs = [
            "javajavascript:script:alert(1)",
            "oonclick=nclick=steal()",
            "java<script:x",
            "<<scr>ipt>",
            "on<load=1",
            "JAVAjavascript:SCRIPT:",
        ];
        for input in inputs {
            assert_clean(&s, &s.sanitize(input));
        }
    }

    #[test]
    fn test_truncates_by_chars() {
        let s = Sanitizer::default();
        let long = "a".repeat(800);
        assert_eq!(s.sanitize(&long).len(), 500);

        let multibyte = "é".repeat(600);
        let out = s.sanitize(&multibyte);
        assert_eq!(out.chars().count(), 500);
        assert_clean(&s, &out);
    }

    #[test]
    fn test_trims_before_truncating() {
        let s = Sanitizer::new(5);
        assert_eq!(s.sanitize("   hello world"), "hello");
    }

    #[test]
    fn test_missing_value() {
        let s = Sanitizer::default();
        assert_eq!(s.sanitize_opt(None), "");
        assert_eq!(s.sanitize_opt(Some("  <>  ")), "");
    }

    #[test]
    fn test_mixed_payloads_stay_clean() {
        let s = Sanitizer::default();
        let padding = "x".repeat(490);
        let inputs = [
            format!("{padding}<script>onclick=javascript:"),
            "<a href=\"javascript:void(0)\" onmouseover=\"go()\">".to_string(),
            "\t onfocus= <svg/onload=alert(1)> ".to_string(),
        ];
        for input in &inputs {
            assert_clean(&s, &s.sanitize(input));
        }
    }

    fn fragment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("<".to_string()),
            Just(">".to_string()),
            Just("javascript:".to_string()),
            Just("JavaScript:".to_string()),
            Just("java".to_string()),
            Just("script:".to_string()),
            Just("on".to_string()),
            Just("=".to_string()),
            "on[a-zA-Z_0-9]{1,6}=",
            "[a-zA-Z0-9 :=']{0,5}",
        ]
    }

    proptest! {
        #[test]
        fn test_output_clean_for_spliced_fragments(
            parts in prop::collection::vec(fragment(), 0..40),
            max in 1usize..64,
        ) {
            let s = Sanitizer::new(max);
            let out = s.sanitize(&parts.concat());
            assert_clean(&s, &out);
        }

        #[test]
        fn test_output_clean_for_any_string(input in any::<String>()) {
            let s = Sanitizer::default();
            let out = s.sanitize(&input);
            assert_clean(&s, &out);
        }
    }
}
