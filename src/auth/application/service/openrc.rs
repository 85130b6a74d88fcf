//! OpenRC credential extraction.
//!
//! OpenRC files are shell scripts exporting `OS_*` variables. We pull the
//! fields we need with per-field patterns; the first match per field wins
//! and a missing field leaves the existing value untouched. Parsing never
//! fails.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::domain::model::credentials::Credentials;

static AUTH_URL: LazyLock<Regex> = LazyLock::new(|| field_pattern("OS_AUTH_URL"));
static PROJECT_DOMAIN: LazyLock<Regex> =
    LazyLock::new(|| field_pattern("OS_PROJECT_DOMAIN(?:_NAME|_ID)"));
static PROJECT_NAME: LazyLock<Regex> = LazyLock::new(|| field_pattern("OS_PROJECT_NAME"));
static USER_DOMAIN: LazyLock<Regex> =
    LazyLock::new(|| field_pattern("OS_USER_DOMAIN(?:_NAME|_ID)"));
static USERNAME: LazyLock<Regex> = LazyLock::new(|| field_pattern("OS_USERNAME"));
static PASSWORD: LazyLock<Regex> = LazyLock::new(|| field_pattern("OS_PASSWORD"));

/// Matches `export VAR=value` (the `export` is optional) with the value
/// either double-quoted, single-quoted or bare.
fn field_pattern(var: &str) -> Regex {
    let pattern = format!(
        r#"(?m)^[ \t]*(?:export[ \t]+)?{}[ \t]*=[ \t]*(?:"([^"]*)"|'([^']*)'|([^\s#]+))"#,
        var
    );
    Regex::new(&pattern).expect("openrc field pattern is valid")
}

fn extract(pattern: &Regex, text: &str) -> Option<String> {
    let captures = pattern.captures(text)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .or_else(|| captures.get(3))
        .map(|m| m.as_str().to_string())
}

/// Builds a new credentials record from `existing` overlaid with whatever
/// fields appear in `text`.
pub fn parse_openrc(existing: &Credentials, text: &str) -> Credentials {
    Credentials {
        auth_url: extract(&AUTH_URL, text).unwrap_or_else(|| existing.auth_url.clone()),
        project_domain: extract(&PROJECT_DOMAIN, text)
            .unwrap_or_else(|| existing.project_domain.clone()),
        project_name: extract(&PROJECT_NAME, text)
            .unwrap_or_else(|| existing.project_name.clone()),
        user_domain: extract(&USER_DOMAIN, text).unwrap_or_else(|| existing.user_domain.clone()),
        username: extract(&USERNAME, text).unwrap_or_else(|| existing.username.clone()),
        password: extract(&PASSWORD, text).unwrap_or_else(|| existing.password.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_openrc_file() {
        let text = r#"#!/usr/bin/env bash
# To use an OpenStack cloud you need to authenticate against the Identity
export OS_AUTH_URL=https://iad.cloud.test:5000/v3
export OS_PROJECT_ID=4e5fa8e0c8d24dd8a8f3dcbcd0f0bd38
export OS_PROJECT_NAME="research"
export OS_USER_DOMAIN_NAME="Default"
export OS_PROJECT_DOMAIN_ID="default"
export OS_USERNAME="alice"
export OS_PASSWORD='hunter2'
export OS_REGION_NAME="IAD"
"#;
        let parsed = parse_openrc(&Credentials::default(), text);
        assert_eq!(parsed.auth_url, "https://iad.cloud.test:5000/v3");
        assert_eq!(parsed.project_name, "research");
        assert_eq!(parsed.project_domain, "default");
        assert_eq!(parsed.user_domain, "Default");
        assert_eq!(parsed.username, "alice");
        assert_eq!(parsed.password, "hunter2");
    }

    #[test]
    fn missing_fields_keep_existing_values() {
        let existing = Credentials {
            password: "keepme".to_string(),
            ..Credentials::default()
        };
        let parsed = parse_openrc(&existing, "export OS_USERNAME=\"alice\"\n");
        assert_eq!(parsed.username, "alice");
        assert_eq!(parsed.password, "keepme");
        assert_eq!(parsed.auth_url, existing.auth_url);
    }

    #[test]
    fn first_match_per_field_wins() {
        let text = "export OS_USERNAME=first\nexport OS_USERNAME=second\n";
        let parsed = parse_openrc(&Credentials::default(), text);
        assert_eq!(parsed.username, "first");
    }

    #[test]
    fn garbage_input_is_not_an_error() {
        let existing = Credentials::default();
        let parsed = parse_openrc(&existing, "this is not a shell script at all");
        assert_eq!(parsed, existing);
    }

    #[test]
    fn unexported_assignments_still_match() {
        let parsed = parse_openrc(&Credentials::default(), "OS_PROJECT_NAME=bare\n");
        assert_eq!(parsed.project_name, "bare");
    }
}
