mod common;

use padlock_sdk::user::{
    CreateUserParams, SetUserRolesParams, UpdateUserParams, UserConfig,
};

use padlock_system::StoreConfig;

use common::{admin_sdk, base_config, empty_roles, roles, setup};

#[tokio::test]
async fn user_crud() {
    let addrs = setup(base_config(roles(&[
        ("reader", &["read"]),
        ("writer", &["read", "write"]),
    ])))
    .await;
    let sdk = admin_sdk(&addrs);

    // Create with a role binding
    let created = sdk
        .user
        .create(&CreateUserParams {
            user: UserConfig {
                user_id: "u1".into(),
                username: Some("john".into()),
                ..UserConfig::default()
            },
            roles: ["reader".to_string()].into_iter().collect(),
        })
        .await
        .unwrap()
        .user;
    assert_eq!(created.user_id(), "u1");
    assert_eq!(
        created.roles,
        ["reader".to_string()].into_iter().collect()
    );

    // Get returns the computed effective permissions
    let fetched = sdk.user.get("u1").await.unwrap().user;
    assert_eq!(
        fetched.associated_permission,
        ["read".to_string()].into_iter().collect()
    );

    // Duplicate creation conflicts
    let err = sdk
        .user
        .create(&CreateUserParams {
            user: UserConfig::new("u1".into()),
            roles: empty_roles(),
        })
        .await
        .unwrap_err();
    assert!(err.contains("409"));

    // Creation with an unconfigured role is rejected
    let err = sdk
        .user
        .create(&CreateUserParams {
            user: UserConfig::new("u2".into()),
            roles: ["ghost".to_string()].into_iter().collect(),
        })
        .await
        .unwrap_err();
    assert!(err.contains("400"));

    // Update identity fields
    let updated = sdk
        .user
        .update(
            "u1",
            &UpdateUserParams {
                user: UserConfig {
                    user_id: "u1".into(),
                    username: Some("john.doe".into()),
                    email: Some("john@example.com".into()),
                    ..UserConfig::default()
                },
            },
        )
        .await
        .unwrap()
        .user;
    assert_eq!(updated.config.username.as_deref(), Some("john.doe"));

    // Update with a mismatched path id is rejected
    let err = sdk
        .user
        .update(
            "u1",
            &UpdateUserParams {
                user: UserConfig::new("someone-else".into()),
            },
        )
        .await
        .unwrap_err();
    assert!(err.contains("400"));

    // Replace role bindings
    let rebound = sdk
        .user
        .set_roles(
            "u1",
            &SetUserRolesParams {
                roles: ["writer".to_string()].into_iter().collect(),
            },
        )
        .await
        .unwrap()
        .user;
    assert_eq!(rebound.roles, ["writer".to_string()].into_iter().collect());
    let fetched = sdk.user.get("u1").await.unwrap().user;
    assert_eq!(
        fetched.associated_permission,
        ["read".to_string(), "write".to_string()]
            .into_iter()
            .collect()
    );

    // List
    let users = sdk.user.list().await.unwrap().users;
    assert_eq!(users.len(), 1);

    // Delete, then the user is gone
    assert_eq!(sdk.user.delete("u1").await.unwrap().user_id, "u1");
    let err = sdk.user.get("u1").await.unwrap_err();
    assert!(err.contains("404"));
    let err = sdk.user.delete("u1").await.unwrap_err();
    assert!(err.contains("404"));
}

#[tokio::test]
async fn user_listing_filters_by_role() {
    let addrs = setup(base_config(roles(&[
        ("reader", &["read"]),
        ("writer", &["write"]),
    ])))
    .await;
    let sdk = admin_sdk(&addrs);

    sdk.user
        .create(&CreateUserParams {
            user: UserConfig::new("u1".into()),
            roles: ["reader".to_string()].into_iter().collect(),
        })
        .await
        .unwrap();
    sdk.user
        .create(&CreateUserParams {
            user: UserConfig::new("u2".into()),
            roles: empty_roles(),
        })
        .await
        .unwrap();

    assert_eq!(sdk.user.list().await.unwrap().users.len(), 2);

    let readers = sdk.user.list_by_role("reader").await.unwrap().users;
    assert_eq!(readers.len(), 1);
    assert_eq!(readers[0].user_id(), "u1");

    // A role nobody is bound to, or that does not exist, yields an empty
    // listing rather than an error
    assert!(sdk.user.list_by_role("writer").await.unwrap().users.is_empty());
    assert!(sdk.user.list_by_role("ghost").await.unwrap().users.is_empty());
}

#[tokio::test]
async fn rejects_invalid_identity_fields() {
    let addrs = setup(base_config(roles(&[("reader", &["read"])]))).await;
    let sdk = admin_sdk(&addrs);

    let err = sdk
        .user
        .create(&CreateUserParams {
            user: UserConfig::new("user id with spaces".into()),
            roles: empty_roles(),
        })
        .await
        .unwrap_err();
    assert!(err.contains("400"));
}

#[tokio::test]
async fn role_listing_reflects_configuration() {
    let addrs = setup(base_config(roles(&[
        ("reader", &["read"]),
        ("writer", &["read", "write"]),
    ])))
    .await;
    let sdk = admin_sdk(&addrs);

    let listed = sdk.role.list().await.unwrap().roles;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].name, "reader");
    assert_eq!(listed[1].name, "writer");

    let role = sdk.role.get("writer").await.unwrap().role;
    assert_eq!(
        role.permissions,
        ["read".to_string(), "write".to_string()]
            .into_iter()
            .collect()
    );

    let err = sdk.role.get("ghost").await.unwrap_err();
    assert!(err.contains("404"));
}

#[tokio::test]
async fn users_survive_a_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir
        .path()
        .join("padlock.db")
        .to_str()
        .unwrap()
        .to_string();

    let mut config = base_config(roles(&[("reader", &["read"])]));
    config.store = StoreConfig { path: path.clone() };
    let addrs = setup(config).await;
    admin_sdk(&addrs)
        .user
        .create(&CreateUserParams {
            user: UserConfig::new("u1".into()),
            roles: ["reader".to_string()].into_iter().collect(),
        })
        .await
        .unwrap();

    // A second instance against the same store sees the user, with the
    // bindings intact after its own reconcile.
    let mut config = base_config(roles(&[("reader", &["read"])]));
    config.store = StoreConfig { path };
    let addrs = setup(config).await;
    let user = admin_sdk(&addrs).user.get("u1").await.unwrap().user;
    assert_eq!(
        user.details.roles,
        ["reader".to_string()].into_iter().collect()
    );
}

#[tokio::test]
async fn health_endpoints() {
    let addrs = setup(base_config(roles(&[("reader", &["read"])]))).await;
    let sdk = admin_sdk(&addrs);

    assert_eq!(sdk.status.alive().await.unwrap(), 200);
    assert_eq!(sdk.status.ready().await.unwrap(), 200);
}
