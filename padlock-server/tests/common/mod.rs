use std::collections::{BTreeSet, HashMap};
use std::convert::Infallible;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use padlock_system::{
    ApisConfig, AuthenticateConfig, AuthorizeConfig, Config, CustomValidationRegex,
    IntrospectionConfig, ListenAddrs, OidcParams, RequestParamHeaders, RoleConfig, ServiceConfig,
    StoreConfig, TargetClaims, UnknownUserConfig, UserManagementConfig,
};
use padlock_types::rule::{AuthorizationRules, HostRule, PathRule};
use rsa::{
    pkcs1::{EncodeRsaPrivateKey, LineEnding},
    traits::PublicKeyParts,
    RsaPrivateKey,
};
use serde_json::json;
use tokio::sync::oneshot;

#[allow(dead_code)]
pub fn service() -> ServiceConfig {
    ServiceConfig {
        listen_on: "127.0.0.1".into(),
        port: 0,
        read_timeout_sec: 60,
        write_timeout_sec: 60,
        idle_timeout_sec: 600,
    }
}

#[allow(dead_code)]
pub fn roles(roles: &[(&str, &[&str])]) -> HashMap<String, RoleConfig> {
    roles
        .iter()
        .map(|(name, permissions)| {
            (
                (*name).to_string(),
                RoleConfig {
                    permissions: permissions.iter().map(ToString::to_string).collect(),
                },
            )
        })
        .collect()
}

#[allow(dead_code)]
pub fn path_rule(pattern: &str, methods: &[(&str, &[&str])]) -> PathRule {
    PathRule {
        path_pattern: pattern.into(),
        permissions_for_method: methods
            .iter()
            .map(|(method, permissions)| {
                (
                    (*method).to_string(),
                    permissions.iter().map(ToString::to_string).collect(),
                )
            })
            .collect(),
    }
}

#[allow(dead_code)]
pub fn host_rule(host: &str, paths: Vec<PathRule>) -> HostRule {
    HostRule {
        host: host.into(),
        paths,
    }
}

/// A config with the admin surface enabled on an ephemeral port and an
/// in-memory store.
#[allow(dead_code)]
pub fn base_config(user_roles: HashMap<String, RoleConfig>) -> Config {
    Config {
        custom_validation_regex: CustomValidationRegex::default(),
        request_id_header: "Padlock-Request-ID".into(),
        store: StoreConfig {
            path: ":memory:".into(),
        },
        user_management: Some(UserManagementConfig {
            enabled: true,
            service: service(),
            apis: ApisConfig::default(),
            user_roles,
        }),
        authorize: None,
        authenticate: None,
        listen_tx: None,
    }
}

#[allow(dead_code)]
pub fn authorize_section(rules: AuthorizationRules, auto_add: bool) -> AuthorizeConfig {
    AuthorizeConfig {
        enabled: true,
        service: service(),
        apis: ApisConfig::default(),
        rules,
        request_param_headers: RequestParamHeaders::default(),
        for_unknown_user: UnknownUserConfig { auto_add },
    }
}

#[allow(dead_code)]
pub fn authenticate_section(
    oidc: OidcParams,
    introspection: IntrospectionConfig,
) -> AuthenticateConfig {
    AuthenticateConfig {
        enabled: true,
        service: service(),
        apis: ApisConfig::default(),
        oidc: Some(oidc),
        target_claims: TargetClaims {
            user_id: "sub".into(),
            username: Some("preferred_username".into()),
            first_name: Some("given_name".into()),
            last_name: Some("family_name".into()),
            email: Some("email".into()),
        },
        request_param_headers: RequestParamHeaders::default(),
        introspection,
    }
}

/// Start the sidecar and wait for its listeners.
#[allow(dead_code)]
pub async fn setup(mut config: Config) -> ListenAddrs {
    let (listen_tx, listen_rx) = oneshot::channel();
    config.listen_tx = Some(listen_tx);

    tokio::spawn(async move {
        if let Err(err) = padlock_system::start(config, padlock_system::shutdown_signal()).await {
            panic!("server error: {}", err);
        }
    });

    listen_rx.await.unwrap()
}

#[allow(dead_code)]
pub fn admin_sdk(addrs: &ListenAddrs) -> padlock_sdk::Client {
    let addr = addrs.user_management.expect("admin surface enabled");
    padlock_sdk::Client::new(format!("http://{addr}/v1"))
}

#[allow(dead_code)]
pub fn authorize_sdk(addrs: &ListenAddrs) -> padlock_sdk::authorize::Client {
    let addr = addrs.authorize.expect("authorize surface enabled");
    padlock_sdk::authorize::Client::new(format!("http://{addr}/v1"))
}

#[allow(dead_code)]
pub fn authenticate_sdk(addrs: &ListenAddrs) -> padlock_sdk::authenticate::Client {
    let addr = addrs.authenticate.expect("authenticate surface enabled");
    padlock_sdk::authenticate::Client::new(format!("http://{addr}/v1"))
}

/// Miniature identity provider serving discovery, JWKS and introspection
/// for the authentication tests.
#[allow(dead_code)]
pub struct TestIdp {
    pub issuer: String,
    /// What the introspection endpoint answers.
    pub active: Arc<AtomicBool>,
    /// How many introspection calls were received.
    pub introspections: Arc<AtomicUsize>,
    private_key: RsaPrivateKey,
}

#[allow(dead_code)]
impl TestIdp {
    pub async fn start() -> Self {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
        let n = URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be());

        let active = Arc::new(AtomicBool::new(true));
        let introspections = Arc::new(AtomicUsize::new(0));

        let addr = std::net::SocketAddr::from(([127, 0, 0, 1], 0));
        let incoming = hyper::server::conn::AddrIncoming::bind(&addr).expect("bind");
        let issuer = format!("http://{}", incoming.local_addr());

        let ctx = (issuer.clone(), n, e, active.clone(), introspections.clone());
        let make_svc = make_service_fn(move |_conn| {
            let ctx = ctx.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                    let (issuer, n, e, active, introspections) = ctx.clone();
                    async move {
                        let body = match req.uri().path() {
                            "/.well-known/openid-configuration" => json!({
                                "issuer": issuer,
                                "jwks_uri": format!("{issuer}/jwks"),
                                "introspection_endpoint": format!("{issuer}/introspect"),
                            }),
                            "/jwks" => json!({
                                "keys": [
                                    { "kid": "test-key", "kty": "RSA", "alg": "RS256", "n": n, "e": e },
                                    { "kid": "ec-key", "kty": "EC", "alg": "ES256" },
                                ]
                            }),
                            "/introspect" => {
                                introspections.fetch_add(1, Ordering::SeqCst);
                                json!({ "active": active.load(Ordering::SeqCst) })
                            }
                            _ => {
                                return Ok::<_, Infallible>(
                                    Response::builder()
                                        .status(404)
                                        .body(Body::empty())
                                        .expect("a valid response"),
                                );
                            }
                        };
                        Ok(Response::builder()
                            .header("content-type", "application/json")
                            .body(Body::from(body.to_string()))
                            .expect("a valid response"))
                    }
                }))
            }
        });

        tokio::spawn(async move {
            if let Err(err) = hyper::Server::builder(incoming).serve(make_svc).await {
                panic!("test idp error: {}", err);
            }
        });

        Self {
            issuer,
            active,
            introspections,
            private_key,
        }
    }

    pub fn oidc_params(&self, with_credentials: bool) -> OidcParams {
        OidcParams {
            issuer: self.issuer.clone(),
            client_id: with_credentials.then(|| "padlock".to_string()),
            client_cred: with_credentials.then(|| "padlock-secret".to_string()),
            http_tls_ca: None,
            request_host_override: None,
        }
    }

    /// Sign a token under the published `test-key`.
    pub fn sign(&self, claims: &serde_json::Value) -> String {
        self.sign_with_kid("test-key", claims)
    }

    pub fn sign_with_kid(&self, kid: &str, claims: &serde_json::Value) -> String {
        let pem = self
            .private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("pem encoding");
        let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("a valid signing key");
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        encode(&header, claims, &key).expect("token signing")
    }
}

#[allow(dead_code)]
pub fn claims(user_id: &str, jti: &str, expires_in_sec: i64) -> serde_json::Value {
    json!({
        "jti": jti,
        "sub": user_id,
        "exp": chrono::Utc::now().timestamp() + expires_in_sec,
        "aud": ["padlock"],
    })
}

#[allow(dead_code)]
pub fn empty_roles() -> BTreeSet<String> {
    BTreeSet::new()
}
