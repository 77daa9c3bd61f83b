//! boundary authorizer
//!
//! Turns the bearer token of an inbound request into a gateway policy document. This runs at
//! request time, once per request, and keeps no state between invocations.
//!
//! Every failure (missing token, bad signature, expired token, ...) surfaces as the same
//! opaque [Unauthorized]. The cause is logged, never returned to the caller.
use crate::value::Value;
use indexmap::IndexMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Serialize, Serializer};

pub const POLICY_VERSION: &str = "2012-10-17";
pub const INVOKE_ACTION: &str = "execute-api:Invoke";
pub const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Decision for a single principal and resource
///
/// Serializes to the gateway policy shape:
/// ```json
/// {
///   "principalId": "user-1",
///   "policyDocument": {
///     "Version": "2012-10-17",
///     "Statement": [{"Action": "execute-api:Invoke", "Effect": "Allow", "Resource": "arn:..."}]
///   },
///   "context": {"userId": "user-1"}
/// }
/// ```
/// `context` is left out when empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    pub principal_id: String,
    pub effect: Effect,
    pub resource: String,
    pub context: IndexMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GatewayPolicy<'a> {
    principal_id: &'a str,
    policy_document: PolicyDocument<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a IndexMap<String, String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PolicyDocument<'a> {
    version: &'static str,
    statement: [Statement<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Statement<'a> {
    action: &'static str,
    effect: Effect,
    resource: &'a str,
}

impl Serialize for AuthDecision {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        GatewayPolicy {
            principal_id: &self.principal_id,
            policy_document: PolicyDocument {
                version: POLICY_VERSION,
                statement: [Statement {
                    action: INVOKE_ACTION,
                    effect: self.effect,
                    resource: &self.resource,
                }],
            },
            context: (!self.context.is_empty()).then_some(&self.context),
        }
        .serialize(serializer)
    }
}

/// Context values lose their type, the gateway only forwards strings
pub fn create_policy(
    principal_id: &str,
    effect: Effect,
    resource: &str,
    context: Option<&IndexMap<String, Value>>,
) -> AuthDecision {
    let context = context
        .into_iter()
        .flatten()
        .map(|(key, value)| (key.clone(), value.to_string()))
        .collect();

    AuthDecision {
        principal_id: principal_id.to_string(),
        effect,
        resource: resource.to_string(),
        context,
    }
}

/// Claims carried by an identity token
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: i64,
}

/// Validated identity
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new)]
pub struct AuthContext {
    pub user_id: String,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub expires_at: Option<i64>,
}

impl AuthContext {
    /// Context forwarded to the downstream handler
    pub fn to_context(&self) -> IndexMap<String, Value> {
        let mut context = IndexMap::new();
        context.insert("userId".to_string(), self.user_id.as_str().into());
        context.insert(
            "email".to_string(),
            self.email.as_deref().unwrap_or_default().into(),
        );
        context.insert("roles".to_string(), self.roles.join(",").into());
        context.insert(
            "expiresAt".to_string(),
            self.expires_at.map(Value::Integer).unwrap_or_else(|| "".into()),
        );
        context
    }
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            roles: claims.roles,
            expires_at: Some(claims.exp),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token rejected: {0}")]
    Rejected(String),
}

pub trait TokenValidator {
    fn validate(&self, token: &str) -> Result<AuthContext, TokenError>;
}

impl<F> TokenValidator for F
where
    F: Fn(&str) -> Result<AuthContext, TokenError>,
{
    fn validate(&self, token: &str) -> Result<AuthContext, TokenError> {
        self(token)
    }
}

/// HMAC-SHA256 signed tokens with a shared secret
pub struct Hs256Validator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256Validator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl TokenValidator for Hs256Validator {
    fn validate(&self, token: &str) -> Result<AuthContext, TokenError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|err| {
            if matches!(err.kind(), ErrorKind::ExpiredSignature) {
                TokenError::Expired
            } else {
                TokenError::Invalid(err)
            }
        })?;
        Ok(data.claims.into())
    }
}

/// Inbound request of a token authorizer
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, derive_new::new)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    #[serde(default)]
    pub authorization_token: String,
    pub method_arn: String,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Unauthorized")]
pub struct Unauthorized;

/// Allows the token's principal to invoke `method_arn`
pub fn authorize(
    request: &AuthorizationRequest,
    validator: &dyn TokenValidator,
) -> Result<AuthDecision, Unauthorized> {
    let token = request
        .authorization_token
        .strip_prefix(BEARER_PREFIX)
        .unwrap_or(&request.authorization_token);

    if token.trim().is_empty() {
        tracing::warn!(resource = %request.method_arn, "no token");
        return Err(Unauthorized);
    }

    let identity = validator.validate(token).map_err(|err| {
        tracing::warn!(resource = %request.method_arn, %err, "token rejected");
        Unauthorized
    })?;

    tracing::debug!(principal = %identity.user_id, resource = %request.method_arn, "allowed");
    Ok(create_policy(
        &identity.user_id,
        Effect::Allow,
        &request.method_arn,
        Some(&identity.to_context()),
    ))
}
