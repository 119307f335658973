use std::collections::HashMap;
use std::str::FromStr;

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, ErrorType};

/// OIDC issuer parameters, loaded from the issuer parameter file.
#[derive(Debug, Clone, Deserialize)]
pub struct OidcParams {
    pub issuer: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_cred: Option<String>,
    /// Extra CA bundle (PEM file path) trusted for issuer HTTP calls.
    #[serde(default)]
    pub http_tls_ca: Option<String>,
    /// Value for the outbound `Host` header, for deployments where DNS for
    /// the issuer differs inside and outside the cluster.
    #[serde(default)]
    pub request_host_override: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    jwks_uri: String,
    #[serde(default)]
    introspection_endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    #[serde(default)]
    kid: Option<String>,
    kty: String,
    #[serde(default)]
    alg: Option<String>,
    // RSA modulus / exponent, base64url
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

/// One JWKS entry. Keys of a type this service cannot verify are kept with
/// `key: None` so a token referencing them fails with `UnknownSigningKey`
/// instead of a lookup miss.
struct SigningKey {
    key: Option<DecodingKey>,
    algorithm: Algorithm,
}

impl TryFrom<Jwk> for SigningKey {
    type Error = Error;

    fn try_from(jwk: Jwk) -> Result<Self, Self::Error> {
        let algorithm = match jwk.alg.as_deref() {
            Some(alg) => Algorithm::from_str(alg).map_err(|_| {
                Error::from(ErrorType::MalformedInput(format!(
                    "JWKS entry carries unsupported algorithm `{alg}`"
                )))
            })?,
            None => Algorithm::RS256,
        };

        let key = match jwk.kty.as_str() {
            "RSA" => {
                let n = jwk.n.as_deref().ok_or_else(|| {
                    Error::from(ErrorType::MalformedInput(
                        "RSA JWKS entry is missing the modulus".into(),
                    ))
                })?;
                let e = jwk.e.as_deref().ok_or_else(|| {
                    Error::from(ErrorType::MalformedInput(
                        "RSA JWKS entry is missing the exponent".into(),
                    ))
                })?;
                let key = DecodingKey::from_rsa_components(n, e).map_err(|err| {
                    Error::from(ErrorType::MalformedInput(format!(
                        "RSA JWKS entry could not be materialized: {err}"
                    )))
                })?;
                Some(key)
            }
            _ => None,
        };

        Ok(Self { key, algorithm })
    }
}

/// Validated claims of a bearer token.
#[derive(Debug)]
pub struct Claims(pub serde_json::Value);

impl Claims {
    /// The claim must be present and a string.
    ///
    /// # Errors
    ///
    /// `MalformedInput` when the claim is missing or not a string.
    pub fn required_string(&self, claim: &str) -> Result<String, Error> {
        self.optional_string(claim)?.ok_or_else(|| {
            ErrorType::MalformedInput(format!("token is missing the `{claim}` claim")).into()
        })
    }

    /// The claim must be a string when present.
    ///
    /// # Errors
    ///
    /// `MalformedInput` when the claim is present but not a string.
    pub fn optional_string(&self, claim: &str) -> Result<Option<String>, Error> {
        match self.0.get(claim) {
            None => Ok(None),
            Some(serde_json::Value::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(ErrorType::MalformedInput(format!(
                "token claim `{claim}` is not a string"
            ))
            .into()),
        }
    }

    /// The `exp` claim, in epoch seconds.
    ///
    /// # Errors
    ///
    /// `MalformedInput` when the claim is missing or not an integer.
    pub fn expires_at(&self) -> Result<i64, Error> {
        self.0
            .get("exp")
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| {
                ErrorType::MalformedInput("token is missing a numeric `exp` claim".into()).into()
            })
    }

    /// The `aud` claim, normalized to a list. Issuers emit either a single
    /// string or an array of strings.
    #[must_use]
    pub fn audiences(&self) -> Vec<String> {
        match self.0.get("aud") {
            Some(serde_json::Value::String(aud)) => vec![aud.clone()],
            Some(serde_json::Value::Array(auds)) => auds
                .iter()
                .filter_map(|aud| aud.as_str().map(ToString::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IntrospectionResponse {
    active: bool,
}

/// Client against the OIDC issuer. Issuer metadata and the JWKS are fetched
/// once at bootstrap; the key map is immutable afterwards.
pub struct OidcClient {
    http: reqwest::Client,
    params: OidcParams,
    introspection_endpoint: Option<String>,
    keys: HashMap<String, SigningKey>,
}

impl OidcClient {
    /// Fetch issuer metadata and the JWKS. A failure here aborts startup.
    #[tracing::instrument(skip_all, fields(issuer = params.issuer))]
    pub async fn bootstrap(params: OidcParams) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(ca_path) = params.http_tls_ca.as_deref() {
            let pem = tokio::fs::read(ca_path).await.map_err(|err| {
                Error::from(ErrorType::InternalError(anyhow::anyhow!(
                    "unable to read CA bundle `{ca_path}`: {err}"
                )))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|err| Error::from(ErrorType::InternalError(err.into())))?;
            builder = builder.add_root_certificate(cert);
        }
        let http = builder
            .build()
            .map_err(|err| Error::from(ErrorType::InternalError(err.into())))?;

        let discovery_url = format!(
            "{}/.well-known/openid-configuration",
            params.issuer.trim_end_matches('/')
        );
        let discovery: DiscoveryDocument = fetch_json(&http, &discovery_url).await?;
        let jwks: JwkSet = fetch_json(&http, &discovery.jwks_uri).await?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            let Some(kid) = jwk.kid.clone() else {
                continue;
            };
            keys.insert(kid, SigningKey::try_from(jwk)?);
        }
        info!(keys = keys.len(), "Loaded signing keys from issuer");

        Ok(Self {
            http,
            params,
            introspection_endpoint: discovery.introspection_endpoint,
            keys,
        })
    }

    fn associated_public_key(&self, header: &jsonwebtoken::Header) -> Result<&SigningKey, Error> {
        let kid = header
            .kid
            .as_deref()
            .ok_or_else(|| Error::from(ErrorType::InvalidToken))?;
        self.keys.get(kid).ok_or_else(|| {
            ErrorType::UnknownSigningKey {
                kid: kid.to_string(),
            }
            .into()
        })
    }

    /// Verify the token signature against the issuer's keys and hand back
    /// its claims.
    ///
    /// # Errors
    ///
    /// `InvalidToken` on structural or signature failure,
    /// `UnknownSigningKey` when the `kid` has no usable key.
    pub fn parse_jwt(&self, raw: &str) -> Result<Claims, Error> {
        let header = decode_header(raw).map_err(|_| Error::from(ErrorType::InvalidToken))?;
        let signing_key = self.associated_public_key(&header)?;
        let key = signing_key.key.as_ref().ok_or_else(|| {
            Error::from(ErrorType::UnknownSigningKey {
                kid: header.kid.clone().unwrap_or_default(),
            })
        })?;

        let mut validation = Validation::new(signing_key.algorithm);
        validation.validate_aud = false;

        let data = decode::<serde_json::Value>(raw, key, &validation)
            .map_err(|_| Error::from(ErrorType::InvalidToken))?;
        Ok(Claims(data.claims))
    }

    /// Whether the issuer published an introspection endpoint and client
    /// credentials are configured.
    #[must_use]
    pub fn can_introspect(&self) -> bool {
        self.introspection_endpoint.is_some()
            && self.params.client_id.is_some()
            && self.params.client_cred.is_some()
    }

    /// Ask the issuer whether the token is still active.
    ///
    /// # Errors
    ///
    /// `IntrospectionFailed` on transport or parse errors, or when
    /// introspection is not configured.
    #[tracing::instrument(skip_all)]
    pub async fn introspect(&self, token: &str) -> Result<bool, Error> {
        let (Some(endpoint), Some(client_id), Some(client_cred)) = (
            self.introspection_endpoint.as_deref(),
            self.params.client_id.as_deref(),
            self.params.client_cred.as_deref(),
        ) else {
            return Err(ErrorType::IntrospectionFailed(anyhow::anyhow!(
                "introspection is not configured for this issuer"
            ))
            .into());
        };

        let mut request = self
            .http
            .post(endpoint)
            .basic_auth(client_id, Some(client_cred))
            .form(&[("token", token)]);
        if let Some(host) = self.params.request_host_override.as_deref() {
            request = request.header(reqwest::header::HOST, host);
        }

        let response: IntrospectionResponse = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| Error::from(ErrorType::IntrospectionFailed(err.into())))?
            .json()
            .await
            .map_err(|err| Error::from(ErrorType::IntrospectionFailed(err.into())))?;

        Ok(response.active)
    }
}

async fn fetch_json<T: serde::de::DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
) -> Result<T, Error> {
    http.get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|err| {
            Error::from(ErrorType::Upstream {
                error: err.into(),
                url: url.to_string(),
            })
        })?
        .json()
        .await
        .map_err(|err| {
            Error::from(ErrorType::Upstream {
                error: err.into(),
                url: url.to_string(),
            })
        })
}
