//! Kubernetes name validation.

use regex::Regex;

/// DNS1035 label: lowercase alphanumeric or '-', must start with a letter,
/// must not end with '-', at most 63 characters.
pub fn is_dns1035_label(name: &str) -> bool {
    if name.is_empty() || name.len() > 63 {
        return false;
    }
    Regex::new(r"^[a-z]([-a-z0-9]*[a-z0-9])?$")
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_labels() {
        for name in ["my-output", "a", "es1", "my-cloudwatch"] {
            assert!(is_dns1035_label(name), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_invalid_labels() {
        let too_long = "a".repeat(64);
        for name in ["", "-leading", "trailing-", "UPPER", "under_score", "1number", too_long.as_str()] {
            assert!(!is_dns1035_label(name), "{name} should be invalid");
        }
    }
}
