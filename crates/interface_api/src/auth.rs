//! Authentication and authorization
//!
//! Bearer tokens are HS256 JWTs carrying the caller's id and a single role.
//! Each route names an [`Operation`]; [`authorize`] decides it once, from
//! the role, the caller id and the owner of the addressed resource.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Longest token lifetime accepted from configuration
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 3600;

/// Caller role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Provider,
    Admin,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the customer, provider or admin id
    pub sub: String,
    pub role: Role,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// The authenticated caller, placed in request extensions by the auth middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl TryFrom<Claims> for Principal {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(Self {
            user_id,
            role: claims.role,
        })
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Not allowed to {0}")]
    Forbidden(&'static str),
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - Caller identifier
/// * `role` - Caller role
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: Uuid,
    role: Role,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let ttl = expiration_secs.min(MAX_TOKEN_TTL_SECS) as i64;
    let exp = now + Duration::seconds(ttl);

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Operations exposed over HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    InitiatePayment,
    VerifyPayment,
    RefundPayment,
    ViewRefundStatus,
    CreatePayout,
    ViewPayouts,
    ManageCards,
    CompleteBooking,
    EstimateQuote,
    ListStuckRefundJobs,
}

impl Operation {
    fn describe(self) -> &'static str {
        match self {
            Operation::InitiatePayment => "initiate this payment",
            Operation::VerifyPayment => "verify this payment",
            Operation::RefundPayment => "refund payments",
            Operation::ViewRefundStatus => "view this refund",
            Operation::CreatePayout => "create payouts",
            Operation::ViewPayouts => "view these payouts",
            Operation::ManageCards => "manage these payment cards",
            Operation::CompleteBooking => "complete this booking",
            Operation::EstimateQuote => "estimate quotes",
            Operation::ListStuckRefundJobs => "list refund jobs",
        }
    }
}

/// Who owns the resource an operation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// No owner; only role-based rules apply
    Nobody,
    Customer(Uuid),
    Provider(Uuid),
}

/// Decides whether `principal` may perform `operation` on a resource owned by `owner`
///
/// Admins may do everything. Customers act on their own bookings and
/// payments; providers on their own cards, payouts and assigned bookings.
pub fn authorize(principal: &Principal, operation: Operation, owner: Owner) -> Result<(), AuthError> {
    let allowed = match (principal.role, operation) {
        (Role::Admin, _) => true,
        (_, Operation::EstimateQuote) => true,
        (
            Role::Customer,
            Operation::InitiatePayment | Operation::VerifyPayment | Operation::ViewRefundStatus,
        ) => owner == Owner::Customer(principal.user_id),
        (
            Role::Provider,
            Operation::ManageCards | Operation::ViewPayouts | Operation::CompleteBooking,
        ) => owner == Owner::Provider(principal.user_id),
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(AuthError::Forbidden(operation.describe()))
    }
}

/// Checks that the principal's role can perform `operation` at all
///
/// Runs before any resource lookup, so a role that is never allowed gets 403
/// whether or not the resource exists. Ownership is checked afterwards with
/// [`authorize`].
pub fn authorize_role(principal: &Principal, operation: Operation) -> Result<(), AuthError> {
    let own = match principal.role {
        Role::Customer => Owner::Customer(principal.user_id),
        Role::Provider => Owner::Provider(principal.user_id),
        Role::Admin => Owner::Nobody,
    };
    authorize(principal, operation, own)
}
