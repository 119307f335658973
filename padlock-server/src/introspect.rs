use std::sync::Arc;

use crate::{
    error::Error,
    oidc::OidcClient,
    token_cache::{clock::Clock, TokenCache},
};

/// Cached "is this token still active?" decision: the cache answers when it
/// can, the issuer is asked otherwise and the verdict is recorded.
#[derive(Clone)]
pub struct Introspector {
    cache: Arc<TokenCache>,
    oidc: Arc<OidcClient>,
    clock: Arc<dyn Clock>,
}

impl Introspector {
    pub fn new(cache: Arc<TokenCache>, oidc: Arc<OidcClient>, clock: Arc<dyn Clock>) -> Self {
        Self { cache, oidc, clock }
    }

    /// Whether the token is still active. `expires_at` is the token's `exp`
    /// claim; it bounds how long a cache hit can stand in for the issuer.
    ///
    /// # Errors
    ///
    /// `IntrospectionFailed` when the issuer cannot be reached or answers
    /// garbage. Cache trouble is never fatal; the issuer is simply asked.
    #[tracing::instrument(skip_all)]
    pub async fn verify_token(&self, token: &str, expires_at: i64) -> Result<bool, Error> {
        let now = self.clock.now();
        if self.cache.valid_in(token, now) {
            return Ok(true);
        }

        if !self.oidc.introspect(token).await? {
            return Ok(false);
        }

        self.cache.record(token, expires_at, now);
        Ok(true)
    }
}
