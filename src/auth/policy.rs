//! # Access Policy
//!
//! A single ordered rule table replaces scattered per-route security wiring.
//! Classification walks the table top-down and the first matching rule wins,
//! so the named auth endpoints and the public catalog paths are listed before
//! the catch-all `/api` prefix rule that gates everything else on ADMIN.
//!
//! `classify` is a pure function of the path: no request state, no method, no
//! headers. The same table answers every question the pipeline asks (which
//! stage owns the path, whether a token is required, which authority gates
//! it), so the three views can never drift apart.

use super::Authority;

/// Path of the credential login endpoint, handled entirely by the login stage.
pub const LOGIN_PATH: &str = "/api/auth/login";

/// Path of the account registration endpoint.
pub const REGISTER_PATH: &str = "/api/auth/register";

/// Path of the token refresh endpoint.
pub const TOKEN_REFRESH_PATH: &str = "/api/auth/token";

/// Catalog read paths that stay public even though they sit under `/api`.
/// The exemption is by path only; a POST to `/api/themes` is just as exempt
/// from token checks as a GET (and then fails routing, not authentication).
pub const PUBLIC_PATHS: [&str; 6] = [
    "/api/data",
    "/api/themes",
    "/api/countries",
    "/api/categories",
    "/api/tags",
    "/api/contentItems",
];

/// Prefix whose subtree is token-protected and gated on ADMIN.
pub const PROTECTED_API_PREFIX: &str = "/api";

/// PathClass
///
/// What the policy decided about a request path. Exactly one class per path;
/// everything that matches no rule falls back to `Public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// No authentication of any kind.
    Public,
    /// Credential login endpoint, owned by the login stage.
    Login,
    /// Account registration endpoint.
    Register,
    /// Token refresh endpoint.
    TokenRefresh,
    /// Requires a valid access token and the rule's authority.
    Protected,
}

/// Access requirement attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone may pass.
    Public,
    /// The authenticated principal must carry this authority.
    Authority(Authority),
}

/// How a rule matches request paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches the path exactly.
    Exact(&'static str),
    /// Matches the prefix itself and every path below it
    /// (`Prefix("/api")` covers `/api` and `/api/x/y`, not `/apix`).
    Prefix(&'static str),
}

impl PathPattern {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(pattern) => path == *pattern,
            PathPattern::Prefix(prefix) => {
                path == *prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

/// One row of the policy table.
#[derive(Debug, Clone)]
pub struct AccessRule {
    pub pattern: PathPattern,
    pub class: PathClass,
    pub access: Access,
}

/// AccessPolicy
///
/// The ordered rule list evaluated first-match-wins. Immutable once built;
/// the router state shares it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    /// The canonical portal table. Order is load-bearing: the auth endpoints
    /// and the public catalog reads must appear before the `/api` prefix rule,
    /// or the prefix rule would swallow them.
    pub fn new() -> Self {
        let mut rules = vec![
            AccessRule {
                pattern: PathPattern::Exact(LOGIN_PATH),
                class: PathClass::Login,
                access: Access::Public,
            },
            AccessRule {
                pattern: PathPattern::Exact(REGISTER_PATH),
                class: PathClass::Register,
                access: Access::Public,
            },
            AccessRule {
                pattern: PathPattern::Exact(TOKEN_REFRESH_PATH),
                class: PathClass::TokenRefresh,
                access: Access::Public,
            },
        ];
        rules.extend(PUBLIC_PATHS.into_iter().map(|path| AccessRule {
            pattern: PathPattern::Exact(path),
            class: PathClass::Public,
            access: Access::Public,
        }));
        rules.push(AccessRule {
            pattern: PathPattern::Prefix(PROTECTED_API_PREFIX),
            class: PathClass::Protected,
            access: Access::Authority(Authority::Admin),
        });
        Self::from_rules(rules)
    }

    /// Builds a policy from an explicit rule list. Kept public so tests can
    /// exercise the evaluation logic against small synthetic tables.
    pub fn from_rules(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    fn rule_for(&self, path: &str) -> Option<&AccessRule> {
        self.rules.iter().find(|rule| rule.pattern.matches(path))
    }

    /// Classifies a request path. Total: paths outside every rule (static
    /// assets, `/health`, the Swagger UI) come back `Public`.
    pub fn classify(&self, path: &str) -> PathClass {
        self.rule_for(path)
            .map(|rule| rule.class)
            .unwrap_or(PathClass::Public)
    }

    /// True when the token stage must leave this path alone. Derived from
    /// [`Self::classify`] so the skip set can never disagree with the table.
    pub fn is_token_exempt(&self, path: &str) -> bool {
        self.classify(path) != PathClass::Protected
    }

    /// The authority a verified principal must carry for this path, if any.
    pub fn required_authority(&self, path: &str) -> Option<Authority> {
        match self.rule_for(path).map(|rule| rule.access) {
            Some(Access::Authority(authority)) => Some(authority),
            _ => None,
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new()
    }
}
