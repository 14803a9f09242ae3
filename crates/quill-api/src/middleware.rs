use axum::{
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use quill_types::api::Claims;

fn claims_from_request(req: &Request) -> Option<Claims> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;

    let secret =
        std::env::var("QUILL_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Extract and validate JWT from the Authorization header.
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let claims = claims_from_request(&req).ok_or(StatusCode::UNAUTHORIZED)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Like [`require_auth`] but anonymous requests pass through without
/// claims — for public pages that personalize when a viewer is known.
pub async fn optional_auth(mut req: Request, next: Next) -> Response {
    if let Some(claims) = claims_from_request(&req) {
        req.extensions_mut().insert(claims);
    }
    next.run(req).await
}
