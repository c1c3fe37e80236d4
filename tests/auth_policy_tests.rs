use mov_portal::auth::{
    Authority, PathClass,
    policy::{
        Access, AccessPolicy, AccessRule, LOGIN_PATH, PUBLIC_PATHS, PathPattern, REGISTER_PATH,
        TOKEN_REFRESH_PATH,
    },
};

// --- Pattern Matching ---

#[test]
fn test_exact_pattern_matches_only_the_literal_path() {
    let pattern = PathPattern::Exact("/api/auth/login");
    assert!(pattern.matches("/api/auth/login"));
    assert!(!pattern.matches("/api/auth/login/"));
    assert!(!pattern.matches("/api/auth/login/extra"));
    assert!(!pattern.matches("/api/auth"));
}

#[test]
fn test_prefix_pattern_covers_subtree_but_not_lookalikes() {
    let pattern = PathPattern::Prefix("/api");
    assert!(pattern.matches("/api"));
    assert!(pattern.matches("/api/users"));
    assert!(pattern.matches("/api/users/42/sessions"));
    // A longer segment that merely starts with the prefix text is a different path.
    assert!(!pattern.matches("/apix"));
    assert!(!pattern.matches("/api-docs/openapi.json"));
}

// --- Canonical Table Classification ---

#[test]
fn test_auth_endpoints_classify_by_name() {
    let policy = AccessPolicy::new();
    assert_eq!(policy.classify(LOGIN_PATH), PathClass::Login);
    assert_eq!(policy.classify(REGISTER_PATH), PathClass::Register);
    assert_eq!(policy.classify(TOKEN_REFRESH_PATH), PathClass::TokenRefresh);
}

#[test]
fn test_public_catalog_paths_stay_public_despite_api_prefix() {
    let policy = AccessPolicy::new();
    for path in PUBLIC_PATHS {
        assert_eq!(
            policy.classify(path),
            PathClass::Public,
            "{path} must be classified Public"
        );
    }
}

#[test]
fn test_everything_else_under_api_is_protected() {
    let policy = AccessPolicy::new();
    assert_eq!(policy.classify("/api"), PathClass::Protected);
    assert_eq!(policy.classify("/api/me"), PathClass::Protected);
    assert_eq!(policy.classify("/api/admin/stats"), PathClass::Protected);
    assert_eq!(policy.classify("/api/admin/themes/7"), PathClass::Protected);
    // Sub-paths of a public path are not in the exact-match set.
    assert_eq!(policy.classify("/api/themes/1"), PathClass::Protected);
    assert_eq!(policy.classify("/api/auth/login/nested"), PathClass::Protected);
}

#[test]
fn test_paths_outside_every_rule_fall_back_to_public() {
    let policy = AccessPolicy::new();
    assert_eq!(policy.classify("/health"), PathClass::Public);
    assert_eq!(policy.classify("/swagger-ui"), PathClass::Public);
    assert_eq!(policy.classify("/api-docs/openapi.json"), PathClass::Public);
    assert_eq!(policy.classify("/"), PathClass::Public);
}

// --- Derived Views ---

#[test]
fn test_token_exemption_agrees_with_classification() {
    let policy = AccessPolicy::new();
    // Exempt by name or class.
    assert!(policy.is_token_exempt(LOGIN_PATH));
    assert!(policy.is_token_exempt(REGISTER_PATH));
    assert!(policy.is_token_exempt(TOKEN_REFRESH_PATH));
    assert!(policy.is_token_exempt("/api/data"));
    assert!(policy.is_token_exempt("/health"));
    // Protected paths are never exempt.
    assert!(!policy.is_token_exempt("/api/me"));
    assert!(!policy.is_token_exempt("/api/admin/stats"));
}

#[test]
fn test_required_authority_is_admin_for_protected_paths_only() {
    let policy = AccessPolicy::new();
    assert_eq!(policy.required_authority("/api/me"), Some(Authority::Admin));
    assert_eq!(
        policy.required_authority("/api/admin/themes"),
        Some(Authority::Admin)
    );
    assert_eq!(policy.required_authority("/api/data"), None);
    assert_eq!(policy.required_authority(LOGIN_PATH), None);
    assert_eq!(policy.required_authority("/health"), None);
}

// --- Rule Ordering ---

#[test]
fn test_first_match_wins_over_later_broader_rules() {
    // A synthetic table where an exact rule precedes a prefix rule that would
    // also match: the exact rule must decide.
    let policy = AccessPolicy::from_rules(vec![
        AccessRule {
            pattern: PathPattern::Exact("/v/open"),
            class: PathClass::Public,
            access: Access::Public,
        },
        AccessRule {
            pattern: PathPattern::Prefix("/v"),
            class: PathClass::Protected,
            access: Access::Authority(Authority::Admin),
        },
    ]);

    assert_eq!(policy.classify("/v/open"), PathClass::Public);
    assert_eq!(policy.classify("/v/closed"), PathClass::Protected);
    assert_eq!(policy.required_authority("/v/open"), None);
}

#[test]
fn test_reversed_order_shadows_the_exact_rule() {
    // The same two rules in the opposite order: the prefix rule swallows
    // everything, which is exactly why table order is part of the contract.
    let policy = AccessPolicy::from_rules(vec![
        AccessRule {
            pattern: PathPattern::Prefix("/v"),
            class: PathClass::Protected,
            access: Access::Authority(Authority::Admin),
        },
        AccessRule {
            pattern: PathPattern::Exact("/v/open"),
            class: PathClass::Public,
            access: Access::Public,
        },
    ]);

    assert_eq!(policy.classify("/v/open"), PathClass::Protected);
}

#[test]
fn test_classification_ignores_query_free_path_variants() {
    // classify receives `uri.path()`, so only path semantics matter here:
    // trailing slashes make a different path and fall through to the prefix rule.
    let policy = AccessPolicy::new();
    assert_eq!(policy.classify("/api/data/"), PathClass::Protected);
    assert_eq!(policy.classify("/api/auth/token/"), PathClass::Protected);
}
