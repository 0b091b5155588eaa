use regex::Regex;

/// Replacement recorded in place of a sensitive field value. The interaction
/// itself is still recorded; only the value is withheld.
pub const MASKED_VALUE: &str = "[masked]";

/// Built-in keywords matched (case-insensitively, as substrings) against a
/// field's `name`/`id` to decide whether its value must be masked.
const SENSITIVE_KEYWORDS: &[&str] = &[
    "email", "phone", "ssn", "credit", "card", "cvv", "pin", "password", "secret", "token",
];

/// Compiled sensitive-field matcher. Extra keywords come from configuration.
#[derive(Debug, Clone)]
pub struct SensitiveFieldMatcher {
    pattern: Regex,
}

impl SensitiveFieldMatcher {
    pub fn new(extra_keywords: &[String]) -> Self {
        let mut alternatives: Vec<String> =
            SENSITIVE_KEYWORDS.iter().map(|k| k.to_string()).collect();
        alternatives.extend(
            extra_keywords
                .iter()
                .filter(|k| !k.is_empty())
                .map(|k| regex::escape(&k.to_lowercase())),
        );
        let pattern = format!("(?i)({})", alternatives.join("|"));
        // Built from fixed words and escaped input; cannot fail to compile.
        let pattern = Regex::new(&pattern)
            .unwrap_or_else(|_| Regex::new("(?i)password").expect("literal pattern"));
        Self { pattern }
    }

    pub fn is_sensitive(&self, field_name: &str) -> bool {
        self.pattern.is_match(field_name)
    }

    /// The field value, or the mask if the field name is sensitive.
    pub fn mask_value<'a>(&self, field_name: &str, value: &'a str) -> &'a str {
        if self.is_sensitive(field_name) {
            MASKED_VALUE
        } else {
            value
        }
    }
}

impl Default for SensitiveFieldMatcher {
    fn default() -> Self {
        Self::new(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_keywords_match_case_insensitively() {
        let matcher = SensitiveFieldMatcher::default();
        assert!(matcher.is_sensitive("email"));
        assert!(matcher.is_sensitive("user_Email"));
        assert!(matcher.is_sensitive("CARD-NUMBER"));
        assert!(matcher.is_sensitive("cc_cvv"));
        assert!(!matcher.is_sensitive("username"));
        assert!(!matcher.is_sensitive("search"));
    }

    #[test]
    fn extra_keywords_extend_the_set() {
        let matcher = SensitiveFieldMatcher::new(&["iban".to_string()]);
        assert!(matcher.is_sensitive("payment_iban"));
        assert!(matcher.is_sensitive("email"));
    }

    #[test]
    fn mask_value_replaces_only_sensitive_fields() {
        let matcher = SensitiveFieldMatcher::default();
        assert_eq!(matcher.mask_value("email", "a@b.com"), MASKED_VALUE);
        assert_eq!(matcher.mask_value("query", "rust"), "rust");
    }
}
