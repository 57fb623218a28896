use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};

pub const ORG_HEADER: &str = "x-org-id";

/// Organization the request operates in, read from `X-Org-Id`. Requests
/// without the header act on the default (empty) organization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgScope(pub String);

impl<S> FromRequestParts<S> for OrgScope
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(ORG_HEADER) {
            None => Ok(Self::default()),
            Some(value) => value
                .to_str()
                .map(|v| Self(v.trim().to_string()))
                .map_err(|_| (StatusCode::BAD_REQUEST, "invalid x-org-id header")),
        }
    }
}

impl OrgScope {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
