use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the caller's tenant identifier.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Validated tenant identifier for the current request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TenantId(pub Uuid);

impl TenantId {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let raw = headers
            .get(TENANT_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Tenant identifier required"))?
            .to_str()
            .map_err(|_| ApiError::unauthorized("Invalid tenant identifier"))?;

        Uuid::parse_str(raw.trim())
            .map(TenantId)
            .map_err(|_| ApiError::unauthorized("Invalid tenant identifier"))
    }
}

/// Rejects tenant-scoped requests without a well-formed tenant id.
pub async fn require_tenant_middleware(mut request: Request, next: Next) -> Response {
    match TenantId::from_headers(request.headers()) {
        Ok(tenant) => {
            request.extensions_mut().insert(tenant);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<TenantId>() {
            Some(tenant) => Ok(*tenant),
            None => TenantId::from_headers(&parts.headers),
        }
    }
}
