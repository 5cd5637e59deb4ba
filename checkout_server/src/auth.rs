use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use checkout_engine::{db_types::UserAccount, traits::AccountManagement, AccountApi};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

/// Alternative to the `Authorization: Bearer` header, for clients that cannot set it.
pub const ACCESS_TOKEN_HEADER: &str = "chk_access_token";

/// The claims carried by an access token. Tokens are issued by the LMS and signed with a shared HS256 secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub is_staff: bool,
    /// Expiry, as a unix timestamp
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        Self { key, validation }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        trace!("🔑️ Access token validated for user #{}", data.claims.user_id);
        Ok(data.claims)
    }
}

/// Pulls the raw access token out of the request headers, preferring the `Authorization` header.
pub fn access_token(req: &HttpRequest) -> Option<&str> {
    let headers = req.headers();
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .or_else(|| headers.get(ACCESS_TOKEN_HEADER).and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let validator = req.app_data::<web::Data<TokenValidator>>().ok_or(AuthError::ConfigurationError)?;
    let token = access_token(req).ok_or(AuthError::MissingToken)?;
    validator.validate(token).map_err(|e| {
        debug!("🔑️ Rejected access token for {}. {e}", req.uri());
        e.into()
    })
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

/// Loads the account behind a validated token. A token for an account that no longer exists is refused.
pub async fn current_user<B: AccountManagement>(
    claims: &JwtClaims,
    api: &AccountApi<B>,
) -> Result<UserAccount, ServerError> {
    api.account_by_id(claims.user_id).await?.ok_or_else(|| {
        debug!("🔑️ Token for {} refers to unknown account #{}", claims.username, claims.user_id);
        AuthError::AccountNotFound.into()
    })
}
