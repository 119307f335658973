mod common;

use padlock_sdk::user::{CreateUserParams, UserConfig};
use padlock_types::rule::AuthorizationRules;

use common::{
    admin_sdk, authorize_sdk, authorize_section, base_config, empty_roles, host_rule, path_rule,
    roles, setup,
};

fn fwd(user_id: &str, method: &str, host: &str, uri: &str) -> Vec<(String, String)> {
    vec![
        ("X-Caller-UserID".to_string(), user_id.to_string()),
        ("X-Forwarded-Method".to_string(), method.to_string()),
        ("X-Forwarded-Host".to_string(), host.to_string()),
        ("X-Forwarded-Uri".to_string(), uri.to_string()),
    ]
}

fn items_rules() -> AuthorizationRules {
    AuthorizationRules {
        hosts: vec![host_rule(
            "api.test",
            vec![path_rule("^/items/[a-z]+$", &[("GET", &["read"])])],
        )],
    }
}

#[tokio::test]
async fn allow_caller_with_matching_permission() {
    let mut config = base_config(roles(&[("reader", &["read"])]));
    config.authorize = Some(authorize_section(items_rules(), false));
    let addrs = setup(config).await;

    let admin = admin_sdk(&addrs);
    admin
        .user
        .create(&CreateUserParams {
            user: UserConfig::new("u1".into()),
            roles: ["reader".to_string()].into_iter().collect(),
        })
        .await
        .unwrap();

    let call = authorize_sdk(&addrs)
        .allow(&fwd("u1", "GET", "api.test", "/items/widgets"))
        .await
        .unwrap();
    assert_eq!(call.status, 200);
    assert!(call.envelope.success);
    assert!(!call.envelope.request_id.is_empty());
}

#[tokio::test]
async fn deny_known_caller_without_permission() {
    let mut config = base_config(roles(&[("reader", &["read"])]));
    config.authorize = Some(authorize_section(items_rules(), false));
    let addrs = setup(config).await;

    let admin = admin_sdk(&addrs);
    admin
        .user
        .create(&CreateUserParams {
            user: UserConfig::new("u2".into()),
            roles: empty_roles(),
        })
        .await
        .unwrap();

    let call = authorize_sdk(&addrs)
        .allow(&fwd("u2", "GET", "api.test", "/items/widgets"))
        .await
        .unwrap();
    assert_eq!(call.status, 403);
    assert!(!call.envelope.success);
    assert_eq!(call.envelope.error.unwrap().code, 403);
}

#[tokio::test]
async fn unknown_caller_is_auto_added_and_denied() {
    let mut config = base_config(roles(&[("reader", &["read"])]));
    config.authorize = Some(authorize_section(items_rules(), true));
    let addrs = setup(config).await;

    // Race two side-calls for the same unseen caller
    let authorize = authorize_sdk(&addrs);
    let other = authorize_sdk(&addrs);
    let req1 = fwd("u3", "GET", "api.test", "/items/widgets");
    let req2 = fwd("u3", "GET", "api.test", "/items/widgets");
    let (first, second) = tokio::join!(authorize.allow(&req1), other.allow(&req2),);
    assert_eq!(first.unwrap().status, 403);
    assert_eq!(second.unwrap().status, 403);

    // Exactly one row exists, with no roles and no permissions
    let admin = admin_sdk(&addrs);
    assert_eq!(admin.user.list().await.unwrap().users.len(), 1);
    let user = admin.user.get("u3").await.unwrap().user;
    assert!(user.details.roles.is_empty());
    assert!(user.associated_permission.is_empty());

    // Another call still denies and still resolves to the same single row
    let call = authorize
        .allow(&fwd("u3", "GET", "api.test", "/items/widgets"))
        .await
        .unwrap();
    assert_eq!(call.status, 403);
    assert_eq!(admin.user.list().await.unwrap().users.len(), 1);
}

#[tokio::test]
async fn unknown_caller_without_auto_add_leaves_no_row() {
    let mut config = base_config(roles(&[("reader", &["read"])]));
    config.authorize = Some(authorize_section(items_rules(), false));
    let addrs = setup(config).await;

    let call = authorize_sdk(&addrs)
        .allow(&fwd("u3", "GET", "api.test", "/items/widgets"))
        .await
        .unwrap();
    assert_eq!(call.status, 403);

    let err = admin_sdk(&addrs).user.get("u3").await.unwrap_err();
    assert!(err.contains("404"));
}

#[tokio::test]
async fn wildcard_host_is_fallback_only() {
    let mut config = base_config(roles(&[("reader", &["read"])]));
    config.authorize = Some(authorize_section(
        AuthorizationRules {
            hosts: vec![
                host_rule(
                    "api.test",
                    vec![path_rule("^/items/[a-z]+$", &[("GET", &["read"])])],
                ),
                host_rule("*", vec![path_rule("^/.*$", &[("*", &["read"])])]),
            ],
        },
        false,
    ));
    let addrs = setup(config).await;

    let admin = admin_sdk(&addrs);
    admin
        .user
        .create(&CreateUserParams {
            user: UserConfig::new("u1".into()),
            roles: ["reader".to_string()].into_iter().collect(),
        })
        .await
        .unwrap();

    let authorize = authorize_sdk(&addrs);

    // Unknown host falls back to the `*` entry
    let call = authorize
        .allow(&fwd("u1", "POST", "other.test", "/any"))
        .await
        .unwrap();
    assert_eq!(call.status, 200);

    // The literal entry wins for its host; its rules know no POST /any, and
    // the `*` host is not consulted
    let call = authorize
        .allow(&fwd("u1", "POST", "api.test", "/any"))
        .await
        .unwrap();
    assert_eq!(call.status, 400);
}

#[tokio::test]
async fn forwarded_path_is_normalized_before_matching() {
    let mut config = base_config(roles(&[("reader", &["read"])]));
    config.authorize = Some(authorize_section(items_rules(), false));
    let addrs = setup(config).await;

    let admin = admin_sdk(&addrs);
    admin
        .user
        .create(&CreateUserParams {
            user: UserConfig::new("u1".into()),
            roles: ["reader".to_string()].into_iter().collect(),
        })
        .await
        .unwrap();

    let call = authorize_sdk(&addrs)
        .allow(&fwd("u1", "GET", "api.test", "/items/./widgets/../widgets"))
        .await
        .unwrap();
    assert_eq!(call.status, 200);
}

#[tokio::test]
async fn malformed_parameters_are_rejected() {
    let mut config = base_config(roles(&[("reader", &["read"])]));
    config.authorize = Some(authorize_section(items_rules(), false));
    let addrs = setup(config).await;
    let authorize = authorize_sdk(&addrs);

    // Missing user id header
    let call = authorize
        .allow(&[
            ("X-Forwarded-Method".to_string(), "GET".to_string()),
            ("X-Forwarded-Host".to_string(), "api.test".to_string()),
            ("X-Forwarded-Uri".to_string(), "/items/widgets".to_string()),
        ])
        .await
        .unwrap();
    assert_eq!(call.status, 400);

    // Method outside the permitted verb set
    let call = authorize
        .allow(&fwd("u1", "FETCH", "api.test", "/items/widgets"))
        .await
        .unwrap();
    assert_eq!(call.status, 400);

    // Unparseable forwarded path
    let call = authorize
        .allow(&fwd("u1", "GET", "api.test", "/items/a b"))
        .await
        .unwrap();
    assert_eq!(call.status, 400);

    // Host failing its validation pattern
    let call = authorize
        .allow(&fwd("u1", "GET", "api test", "/items/widgets"))
        .await
        .unwrap();
    assert_eq!(call.status, 400);
}

#[tokio::test]
async fn unmatched_surface_is_bad_request_not_forbidden() {
    let mut config = base_config(roles(&[("reader", &["read"])]));
    config.authorize = Some(authorize_section(items_rules(), false));
    let addrs = setup(config).await;

    let admin = admin_sdk(&addrs);
    admin
        .user
        .create(&CreateUserParams {
            user: UserConfig::new("u1".into()),
            roles: ["reader".to_string()].into_iter().collect(),
        })
        .await
        .unwrap();

    // Policy does not know this API at all
    let call = authorize_sdk(&addrs)
        .allow(&fwd("u1", "GET", "api.test", "/unknown"))
        .await
        .unwrap();
    assert_eq!(call.status, 400);
    assert_eq!(call.envelope.error.unwrap().code, 400);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let mut config = base_config(roles(&[("reader", &["read"])]));
    config.authorize = Some(authorize_section(items_rules(), false));
    let addrs = setup(config).await;

    let mut headers = fwd("u1", "GET", "api.test", "/items/widgets");
    headers.push(("Padlock-Request-ID".to_string(), "corr-42".to_string()));
    let call = authorize_sdk(&addrs).allow(&headers).await.unwrap();

    assert_eq!(call.envelope.request_id, "corr-42");
    assert_eq!(
        call.headers.get("padlock-request-id").map(String::as_str),
        Some("corr-42")
    );
}

#[tokio::test]
async fn health_endpoints() {
    let mut config = base_config(roles(&[("reader", &["read"])]));
    config.authorize = Some(authorize_section(items_rules(), false));
    let addrs = setup(config).await;

    let authorize = authorize_sdk(&addrs);
    assert_eq!(authorize.alive().await.unwrap(), 200);
    assert_eq!(authorize.ready().await.unwrap(), 200);
}
