use actix_web::dev::Payload;
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::domain::access::{Caller, Role};
use super::errors::Unauthenticated;

// ============================================================================
// Caller Identity Extraction
// ============================================================================
//
// The upstream auth gateway authenticates the session and forwards the
// caller as two headers. Requests without them never reach a handler.
//
// ============================================================================

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, Unauthenticated> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Unauthenticated(format!("Missing {} header", name)))
}

pub fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, Unauthenticated> {
    let user_id = header(headers, USER_ID_HEADER)?
        .parse::<Uuid>()
        .map_err(|_| Unauthenticated(format!("{} is not a valid id", USER_ID_HEADER)))?;
    let role = header(headers, USER_ROLE_HEADER)?
        .parse::<Role>()
        .map_err(|e| Unauthenticated(e.to_string()))?;

    Ok(Caller::new(user_id, role))
}

impl FromRequest for Caller {
    type Error = Unauthenticated;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(caller_from_headers(req.headers()))
    }
}
