use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Key that selects the fallback entry in host and method maps.
pub const WILDCARD: &str = "*";

/// Configuration form of the authorization rule tree
/// (host -> path pattern -> method -> permissions). Compiled into the
/// matcher tree once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRules {
    #[serde(default)]
    pub hosts: Vec<HostRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HostRule {
    /// Host literal, or `*` for the fallback entry.
    pub host: String,
    pub paths: Vec<PathRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PathRule {
    /// Regex tested against the normalized request path.
    pub path_pattern: String,
    /// Method literal (`GET`, `POST`, ...) or `*` -> permissions that
    /// authorize the call.
    pub permissions_for_method: HashMap<String, Vec<String>>,
}

impl AuthorizationRules {
    /// Structural validation: no duplicate host within the group, no
    /// duplicate pattern within a host, no duplicate permission within a
    /// method list. Method-name and permission-name validity is checked by
    /// the server against its configured validators.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first duplicate found.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut hosts = HashSet::new();
        for host_rule in &self.hosts {
            if !hosts.insert(host_rule.host.as_str()) {
                anyhow::bail!("duplicate host `{}` in authorization rules", host_rule.host);
            }

            let mut patterns = HashSet::new();
            for path_rule in &host_rule.paths {
                if !patterns.insert(path_rule.path_pattern.as_str()) {
                    anyhow::bail!(
                        "duplicate path pattern `{}` for host `{}`",
                        path_rule.path_pattern,
                        host_rule.host
                    );
                }

                for (method, permissions) in &path_rule.permissions_for_method {
                    let mut seen = HashSet::new();
                    for permission in permissions {
                        if !seen.insert(permission.as_str()) {
                            anyhow::bail!(
                                "duplicate permission `{permission}` for method `{method}` of pattern `{}`",
                                path_rule.path_pattern
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Every permission referenced anywhere in the tree.
    #[must_use]
    pub fn referenced_permissions(&self) -> HashSet<&str> {
        self.hosts
            .iter()
            .flat_map(|host| &host.paths)
            .flat_map(|path| path.permissions_for_method.values())
            .flatten()
            .map(String::as_str)
            .collect()
    }
}
