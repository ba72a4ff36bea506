//! Post-verification authorization policy: the organizational-domain
//! gate and the admin allow-list. Both are pure functions over verified
//! claims; neither ever substitutes for token verification.

/// Whether a verified identity belongs to the required domain.
///
/// Allowed when the `hd` claim equals the required domain or the email
/// carries it as an exact `@domain` suffix, both case-insensitive. The
/// `hd` parameter on the authorization request is a UX hint only; this
/// is the enforcement point.
pub fn domain_allowed(
    hosted_domain: Option<&str>,
    email: Option<&str>,
    required_domain: &str,
) -> bool {
    if required_domain.is_empty() {
        return true;
    }

    let required = required_domain.to_ascii_lowercase();
    let hd_matches = hosted_domain.is_some_and(|hd| hd.eq_ignore_ascii_case(&required));
    let email_matches = email.is_some_and(|email| {
        email
            .to_ascii_lowercase()
            .ends_with(&format!("@{required}"))
    });

    hd_matches || email_matches
}

/// Case-insensitive membership test against the configured admin
/// allow-list. Gates the admin view only, never a data mutation.
pub fn is_admin(email: &str, allow_list: &[String]) -> bool {
    allow_list
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosted_domain_match_is_allowed() {
        assert!(domain_allowed(Some("example.com"), None, "example.com"));
        assert!(domain_allowed(Some("EXAMPLE.COM"), None, "example.com"));
    }

    #[test]
    fn email_suffix_match_is_allowed_without_hosted_domain() {
        assert!(domain_allowed(None, Some("a@example.com"), "example.com"));
        assert!(domain_allowed(None, Some("A@EXAMPLE.com"), "example.com"));
    }

    #[test]
    fn empty_hosted_domain_falls_back_to_email() {
        // A consumer account inside the domain reports hd="" but a
        // matching email address.
        assert!(domain_allowed(Some(""), Some("a@example.com"), "example.com"));
    }

    #[test]
    fn outside_domain_is_denied() {
        assert!(!domain_allowed(None, Some("a@other.com"), "example.com"));
        assert!(!domain_allowed(Some("other.com"), Some("a@other.com"), "example.com"));
    }

    #[test]
    fn subdomain_suffix_does_not_match() {
        assert!(!domain_allowed(None, Some("a@notexample.com"), "example.com"));
    }

    #[test]
    fn no_required_domain_allows_everyone() {
        assert!(domain_allowed(None, None, ""));
    }

    #[test]
    fn admin_list_is_case_insensitive() {
        let list = vec!["admin@example.com".to_string()];
        assert!(is_admin("admin@example.com", &list));
        assert!(is_admin("Admin@Example.COM", &list));
        assert!(!is_admin("user@example.com", &list));
    }

    #[test]
    fn empty_admin_list_denies_everyone() {
        assert!(!is_admin("admin@example.com", &[]));
    }
}
