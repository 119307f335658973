use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;

use padlock_types::rule::{AuthorizationRules, WILDCARD};
use serde::Deserialize;
use tokio::sync::oneshot;

use crate::{checker::Validators, oidc::OidcParams};

pub const DEFAULT_REQUEST_ID_HEADER: &str = "Padlock-Request-ID";

/// Top-level service configuration, normally loaded from a YAML file by the
/// CLI. Each subsystem section is optional; a missing section means the
/// subsystem does not run.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub custom_validation_regex: CustomValidationRegex,
    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,
    pub store: StoreConfig,
    #[serde(default)]
    pub user_management: Option<UserManagementConfig>,
    #[serde(default)]
    pub authorize: Option<AuthorizeConfig>,
    #[serde(default)]
    pub authenticate: Option<AuthenticateConfig>,
    /// Reports the bound addresses once all listeners are up. Used by tests
    /// that bind ephemeral ports.
    #[serde(skip)]
    pub listen_tx: Option<oneshot::Sender<ListenAddrs>>,
}

/// The addresses the enabled subsystems ended up listening on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenAddrs {
    pub user_management: Option<SocketAddr>,
    pub authorize: Option<SocketAddr>,
    pub authenticate: Option<SocketAddr>,
}

/// Patterns for the field validators; unset entries use the built-in
/// defaults from `checker`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomValidationRegex {
    #[serde(default, rename = "userID")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub personal_name: Option<String>,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// SQLite database path; `:memory:` keeps everything in process.
    pub path: String,
}

impl StoreConfig {
    #[must_use]
    pub fn using_inmemory_storage(&self) -> bool {
        self.path.contains(":memory:")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    #[serde(default = "default_listen_on")]
    pub listen_on: String,
    pub port: u16,
    #[serde(default = "default_read_timeout_sec")]
    pub read_timeout_sec: u64,
    #[serde(default = "default_write_timeout_sec")]
    pub write_timeout_sec: u64,
    #[serde(default = "default_idle_timeout_sec")]
    pub idle_timeout_sec: u64,
}

impl ServiceConfig {
    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns an error when `listenOn` does not parse as an IP address.
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.listen_on, self.port)
            .parse()
            .map_err(|_| anyhow::anyhow!("`{}` is not a valid listen address", self.listen_on))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApisConfig {
    #[serde(default = "default_api_prefix")]
    pub prefix: String,
}

impl Default for ApisConfig {
    fn default() -> Self {
        Self {
            prefix: default_api_prefix(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleConfig {
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserManagementConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub service: ServiceConfig,
    #[serde(default)]
    pub apis: ApisConfig,
    /// Role name -> granted permissions. The role registry is reconciled
    /// from this map on every start.
    #[serde(default)]
    pub user_roles: HashMap<String, RoleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub service: ServiceConfig,
    #[serde(default)]
    pub apis: ApisConfig,
    #[serde(default)]
    pub rules: AuthorizationRules,
    #[serde(default)]
    pub request_param_headers: RequestParamHeaders,
    #[serde(default)]
    pub for_unknown_user: UnknownUserConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownUserConfig {
    /// Create a user row for ids the store has never seen. The call is still
    /// denied; the row just makes the user bindable afterwards.
    #[serde(default)]
    pub auto_add: bool,
}

/// Names of the headers the proxy uses to forward request parameters, and
/// under which the authentication subsystem emits identity values.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParamHeaders {
    #[serde(default = "default_host_header")]
    pub host: String,
    #[serde(default = "default_uri_header")]
    pub uri: String,
    #[serde(default = "default_method_header")]
    pub method: String,
    #[serde(default = "default_user_id_header", rename = "userID")]
    pub user_id: String,
    #[serde(default = "default_username_header")]
    pub username: String,
    #[serde(default = "default_first_name_header")]
    pub first_name: String,
    #[serde(default = "default_last_name_header")]
    pub last_name: String,
    #[serde(default = "default_email_header")]
    pub email: String,
}

impl Default for RequestParamHeaders {
    fn default() -> Self {
        Self {
            host: default_host_header(),
            uri: default_uri_header(),
            method: default_method_header(),
            user_id: default_user_id_header(),
            username: default_username_header(),
            first_name: default_first_name_header(),
            last_name: default_last_name_header(),
            email: default_email_header(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub service: ServiceConfig,
    #[serde(default)]
    pub apis: ApisConfig,
    /// Issuer parameters. Usually loaded from the separate OIDC parameter
    /// file by the CLI, but may be inlined.
    #[serde(default)]
    pub oidc: Option<OidcParams>,
    pub target_claims: TargetClaims,
    #[serde(default)]
    pub request_param_headers: RequestParamHeaders,
    #[serde(default)]
    pub introspection: IntrospectionConfig,
}

/// Names of the JWT claims the identity fields come from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetClaims {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_cache_clean_interval_sec")]
    pub cache_clean_interval_sec: u64,
    #[serde(default = "default_cache_purge_interval_sec")]
    pub cache_purge_interval_sec: u64,
    /// How long a cached introspection verdict stands in for the issuer.
    #[serde(default = "default_re_introspect_interval_sec")]
    pub re_introspect_interval_sec: u64,
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cache_clean_interval_sec: default_cache_clean_interval_sec(),
            cache_purge_interval_sec: default_cache_purge_interval_sec(),
            re_introspect_interval_sec: default_re_introspect_interval_sec(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn user_management_enabled(&self) -> bool {
        self.user_management
            .as_ref()
            .map_or(false, |section| section.enabled)
    }

    #[must_use]
    pub fn authorize_enabled(&self) -> bool {
        self.authorize
            .as_ref()
            .map_or(false, |section| section.enabled)
    }

    #[must_use]
    pub fn authenticate_enabled(&self) -> bool {
        self.authenticate
            .as_ref()
            .map_or(false, |section| section.enabled)
    }

    /// The configured role -> permission map.
    #[must_use]
    pub fn role_permissions(&self) -> HashMap<String, BTreeSet<String>> {
        self.user_management
            .as_ref()
            .map(|section| {
                section
                    .user_roles
                    .iter()
                    .map(|(name, role)| (name.clone(), role.permissions.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cross-field validation, run once before anything starts.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first problem found.
    pub fn sanitize(&self) -> anyhow::Result<()> {
        if !self.user_management_enabled()
            && !self.authorize_enabled()
            && !self.authenticate_enabled()
        {
            return Err(anyhow::anyhow!("no subsystem is enabled"));
        }

        let validators = Validators::new(&self.custom_validation_regex)
            .map_err(|err| anyhow::anyhow!("{}", err.variant))?;

        let roles = self.role_permissions();
        for (name, permissions) in &roles {
            if !validators.role_name.matches(name) {
                return Err(anyhow::anyhow!("`{name}` is not a valid role name"));
            }
            for permission in permissions {
                if !validators.permission.matches(permission) {
                    return Err(anyhow::anyhow!(
                        "`{permission}` of role `{name}` is not a valid permission"
                    ));
                }
            }
        }

        if let Some(authorize) = self.authorize.as_ref().filter(|section| section.enabled) {
            authorize.rules.validate()?;

            for host in &authorize.rules.hosts {
                if host.host != WILDCARD && !validators.hostname.matches(&host.host) {
                    return Err(anyhow::anyhow!("`{}` is not a valid rule host", host.host));
                }
            }

            // Every permission a rule hands out must be grantable through
            // some configured role.
            let granted: BTreeSet<&str> = roles
                .values()
                .flatten()
                .map(String::as_str)
                .collect();
            for permission in authorize.rules.referenced_permissions() {
                if !granted.contains(permission) {
                    return Err(anyhow::anyhow!(
                        "rule permission `{permission}` is not granted by any configured role"
                    ));
                }
            }
        }

        if let Some(authenticate) = self.authenticate.as_ref().filter(|section| section.enabled) {
            let Some(oidc) = authenticate.oidc.as_ref() else {
                return Err(anyhow::anyhow!(
                    "authenticate is enabled but no OIDC issuer is configured"
                ));
            };
            if authenticate.introspection.enabled
                && (oidc.client_id.is_none() || oidc.client_cred.is_none())
            {
                return Err(anyhow::anyhow!(
                    "introspection requires OIDC client credentials"
                ));
            }
        }

        Ok(())
    }
}

fn default_request_id_header() -> String {
    DEFAULT_REQUEST_ID_HEADER.to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_listen_on() -> String {
    "0.0.0.0".to_string()
}

fn default_read_timeout_sec() -> u64 {
    60
}

fn default_write_timeout_sec() -> u64 {
    60
}

fn default_idle_timeout_sec() -> u64 {
    600
}

fn default_api_prefix() -> String {
    "/v1".to_string()
}

fn default_host_header() -> String {
    "X-Forwarded-Host".to_string()
}

fn default_uri_header() -> String {
    "X-Forwarded-Uri".to_string()
}

fn default_method_header() -> String {
    "X-Forwarded-Method".to_string()
}

fn default_user_id_header() -> String {
    "X-Caller-UserID".to_string()
}

fn default_username_header() -> String {
    "X-Caller-Username".to_string()
}

fn default_first_name_header() -> String {
    "X-Caller-Firstname".to_string()
}

fn default_last_name_header() -> String {
    "X-Caller-Lastname".to_string()
}

fn default_email_header() -> String {
    "X-Caller-Email".to_string()
}

fn default_cache_clean_interval_sec() -> u64 {
    60
}

fn default_cache_purge_interval_sec() -> u64 {
    3600
}

fn default_re_introspect_interval_sec() -> u64 {
    300
}
