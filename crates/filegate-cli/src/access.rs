//! Path-based access rules
//!
//! A request is authorized when every rule matching its path (and method)
//! names a role the caller holds. Paths no rule matches are open.

use crate::auth::{RoleSet, ADMIN_ROLE};
use axum::http::Method;
use std::sync::LazyLock;

static DEFAULT_POLICY: LazyLock<AccessPolicy> = LazyLock::new(AccessPolicy::default);

/// One protected path pattern
#[derive(Clone, Debug)]
pub struct AccessRule {
    /// Ant-style pattern: `*` matches one segment, `**` any number
    pub pattern: String,
    /// Methods the rule applies to; `None` means all
    pub methods: Option<Vec<Method>>,
    pub required_role: String,
}

impl AccessRule {
    pub fn new(pattern: impl Into<String>, required_role: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            methods: None,
            required_role: required_role.into(),
        }
    }

    /// Restrict the rule to the given methods
    pub fn for_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    /// Whether the rule applies to this request
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        let method_matches = self
            .methods
            .as_ref()
            .map_or(true, |methods| methods.contains(method));
        method_matches && pattern_matches(&self.pattern, path)
    }
}

/// Ordered rule table
#[derive(Clone, Debug)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(vec![
            AccessRule::new("/*/remove/**", ADMIN_ROLE),
            AccessRule::new("/*/upload/**", ADMIN_ROLE),
            AccessRule::new("/remove/**", ADMIN_ROLE),
        ])
    }
}

impl AccessPolicy {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    /// Roles the caller must hold for this request, deduplicated
    pub fn required_roles(&self, method: &Method, path: &str) -> RoleSet {
        self.rules
            .iter()
            .filter(|rule| rule.matches(method, path))
            .map(|rule| rule.required_role.clone())
            .collect()
    }

    /// Whether any rule guards this request
    pub fn requires_authentication(&self, method: &Method, path: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(method, path))
    }

    pub fn is_authorized(&self, roles: &RoleSet, method: &Method, path: &str) -> bool {
        self.required_roles(method, path).is_subset(roles)
    }
}

/// Check a request against the built-in rule table
pub fn is_authorized(roles: &RoleSet, method: &Method, path: &str) -> bool {
    DEFAULT_POLICY.is_authorized(roles, method, path)
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Ant-style match over `/`-separated segments
pub fn pattern_matches(pattern: &str, path: &str) -> bool {
    match_segments(&segments(pattern), &segments(path))
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => (0..=path.len()).any(|skip| match_segments(rest, &path[skip..])),
        Some((&head, rest)) => match path.split_first() {
            Some((&segment, path_rest)) => {
                (head == "*" || head == segment) && match_segments(rest, path_rest)
            }
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn roles(names: &[&str]) -> RoleSet {
        names.iter().map(|r| r.to_string()).collect()
    }

    #[rstest]
    #[case("/*/remove/**", "/docs/remove/files/a.pdf", true)]
    #[case("/*/remove/**", "/docs/remove", true)]
    #[case("/*/remove/**", "/remove/folders/docs", false)]
    #[case("/*/upload/**", "/docs/upload/files", true)]
    #[case("/*/upload/**", "/a/b/upload/files", false)]
    #[case("/remove/**", "/remove/folders/docs", true)]
    #[case("/remove/**", "/docs/retrieve/files/remove", false)]
    #[case("/*", "/docs", true)]
    #[case("/*", "/", false)]
    #[case("/**", "/", true)]
    fn test_pattern_matches(#[case] pattern: &str, #[case] path: &str, #[case] expected: bool) {
        assert_eq!(pattern_matches(pattern, path), expected);
    }

    #[rstest]
    #[case(&[], Method::GET, "/docs/retrieve/files/a.pdf", true)]
    #[case(&[], Method::POST, "/docs/upload/files", false)]
    #[case(&["ADMIN"], Method::DELETE, "/docs/remove/files/a.pdf", true)]
    #[case(&["viewer"], Method::DELETE, "/docs/remove/files/a.pdf", false)]
    #[case(&["admin"], Method::POST, "/docs/upload/files", false)]
    #[case(&["viewer"], Method::DELETE, "/remove/folders/docs", false)]
    #[case(&["ADMIN", "viewer"], Method::DELETE, "/remove/folders/docs", true)]
    #[case(&[], Method::GET, "/health", true)]
    fn test_default_policy(
        #[case] held: &[&str],
        #[case] method: Method,
        #[case] path: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(is_authorized(&roles(held), &method, path), expected);
    }

    #[test]
    fn test_open_paths_need_no_authentication() {
        let policy = AccessPolicy::default();
        assert!(!policy.requires_authentication(&Method::GET, "/docs/retrieve/files/a.pdf"));
        assert!(policy.requires_authentication(&Method::POST, "/docs/upload/files"));
    }

    #[test]
    fn test_every_matching_rule_must_be_satisfied() {
        let policy = AccessPolicy::new(vec![
            AccessRule::new("/**", "reader"),
            AccessRule::new("/*/upload/**", ADMIN_ROLE).for_methods([Method::POST]),
        ]);

        let path = "/docs/upload/files";
        assert_eq!(
            policy.required_roles(&Method::POST, path),
            roles(&["ADMIN", "reader"])
        );
        assert!(!policy.is_authorized(&roles(&["ADMIN"]), &Method::POST, path));
        assert!(policy.is_authorized(&roles(&["ADMIN", "reader"]), &Method::POST, path));
        assert!(policy.is_authorized(&roles(&["reader"]), &Method::GET, path));
    }
}
