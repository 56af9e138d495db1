use axum::async_trait;
use axum::extract::FromRef;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use clap::ValueEnum;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use vm_common::Event;

use crate::error::ApiError;

/// Headers a trusted backend holding the API key uses to act for an end user.
pub const ACTING_SUBJECT_HEADER: &str = "x-acting-subject";
pub const ACTING_ROLE_HEADER: &str = "x-acting-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum AuthMode {
    ApiKey,
    Jwt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtKeyKind {
    Secret,
    Rsa,
    Ec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum JwtAlgorithm {
    Hs256,
    Hs384,
    Hs512,
    Rs256,
    Rs384,
    Rs512,
    Es256,
    Es384,
}

impl JwtAlgorithm {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            JwtAlgorithm::Hs256 => Algorithm::HS256,
            JwtAlgorithm::Hs384 => Algorithm::HS384,
            JwtAlgorithm::Hs512 => Algorithm::HS512,
            JwtAlgorithm::Rs256 => Algorithm::RS256,
            JwtAlgorithm::Rs384 => Algorithm::RS384,
            JwtAlgorithm::Rs512 => Algorithm::RS512,
            JwtAlgorithm::Es256 => Algorithm::ES256,
            JwtAlgorithm::Es384 => Algorithm::ES384,
        }
    }

    pub fn key_kind(&self) -> JwtKeyKind {
        match self {
            JwtAlgorithm::Hs256 | JwtAlgorithm::Hs384 | JwtAlgorithm::Hs512 => JwtKeyKind::Secret,
            JwtAlgorithm::Rs256 | JwtAlgorithm::Rs384 | JwtAlgorithm::Rs512 => JwtKeyKind::Rsa,
            JwtAlgorithm::Es256 | JwtAlgorithm::Es384 => JwtKeyKind::Ec,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub api_key: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_public_key: Option<String>,
    pub jwt_algorithm: JwtAlgorithm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Volunteer,
    Organization,
    /// API-key caller without an acting user.
    Service,
}

impl Role {
    fn parse_user_role(raw: &str) -> Option<Role> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "volunteer" => Some(Role::Volunteer),
            "organization" => Some(Role::Organization),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub subject: String,
    /// `None` when the token carries no recognised role.
    pub role: Option<Role>,
}

impl AuthUser {
    pub fn is_service(&self) -> bool {
        self.role == Some(Role::Service)
    }

    pub fn volunteer_id(&self) -> Result<&str, ApiError> {
        match self.role {
            Some(Role::Volunteer) => Ok(&self.subject),
            _ => Err(ApiError::Forbidden("volunteer role required".into())),
        }
    }

    pub fn organization_id(&self) -> Result<&str, ApiError> {
        match self.role {
            Some(Role::Organization) => Ok(&self.subject),
            _ => Err(ApiError::Forbidden("organization role required".into())),
        }
    }

    /// Organizations may only manage their own events; service callers may
    /// manage any.
    pub fn ensure_owner(&self, event: &Event) -> Result<(), ApiError> {
        if self.is_service() {
            return Ok(());
        }
        let organization_id = self.organization_id()?;
        if organization_id != event.organization_id {
            return Err(ApiError::Forbidden(format!(
                "event {} belongs to another organization",
                event.id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    role: Option<String>,
    #[allow(dead_code)]
    exp: Option<usize>,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);

        match config.mode {
            AuthMode::ApiKey => authorize_api_key(parts, &config),
            AuthMode::Jwt => authorize_jwt(parts, &config),
        }
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn authorize_api_key(parts: &Parts, config: &AuthConfig) -> Result<AuthUser, ApiError> {
    let expected = config
        .api_key
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("missing VM_API_KEY".into()))?;

    let provided = header_value(parts, "x-api-key")
        .ok_or_else(|| ApiError::Unauthorized("missing X-API-Key header".into()))?;

    if provided != expected {
        return Err(ApiError::Unauthorized("invalid API key".into()));
    }

    match (
        header_value(parts, ACTING_SUBJECT_HEADER),
        header_value(parts, ACTING_ROLE_HEADER),
    ) {
        (Some(subject), Some(role)) => {
            let role = Role::parse_user_role(role).ok_or_else(|| {
                ApiError::BadRequest(format!("unsupported {ACTING_ROLE_HEADER}: {role}"))
            })?;
            Ok(AuthUser {
                subject: subject.to_string(),
                role: Some(role),
            })
        }
        (None, None) => Ok(AuthUser {
            subject: "api_key".to_string(),
            role: Some(Role::Service),
        }),
        _ => Err(ApiError::BadRequest(format!(
            "{ACTING_SUBJECT_HEADER} and {ACTING_ROLE_HEADER} must be sent together"
        ))),
    }
}

fn decoding_key(config: &AuthConfig) -> Result<DecodingKey, ApiError> {
    match config.jwt_algorithm.key_kind() {
        JwtKeyKind::Secret => {
            let secret = config
                .jwt_secret
                .as_deref()
                .ok_or_else(|| ApiError::Unauthorized("missing JWT_SECRET".into()))?;
            Ok(DecodingKey::from_secret(secret.as_bytes()))
        }
        kind => {
            let pem = config
                .jwt_public_key
                .as_deref()
                .ok_or_else(|| ApiError::Unauthorized("missing JWT_PUBLIC_KEY".into()))?;
            let key = match kind {
                JwtKeyKind::Rsa => DecodingKey::from_rsa_pem(pem.as_bytes()),
                _ => DecodingKey::from_ec_pem(pem.as_bytes()),
            };
            key.map_err(|err| ApiError::Internal(format!("invalid JWT_PUBLIC_KEY: {err}")))
        }
    }
}

fn authorize_jwt(parts: &Parts, config: &AuthConfig) -> Result<AuthUser, ApiError> {
    let header = header_value(parts, AUTHORIZATION.as_str())
        .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("expected Bearer token".into()))?;

    let validation = Validation::new(config.jwt_algorithm.algorithm());
    let data = decode::<Claims>(token, &decoding_key(config)?, &validation)
        .map_err(|err| ApiError::Unauthorized(format!("invalid token: {err}")))?;

    Ok(AuthUser {
        subject: data.claims.sub,
        role: data.claims.role.as_deref().and_then(Role::parse_user_role),
    })
}
