use std::sync::Arc;

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
    body::Body,
};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};

use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_config::AppConfig;

use crate::jwt::validate_token;

pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !request.headers().contains_key(axum::http::header::AUTHORIZATION) {
        return Err(AppError::Auth("No token, authorization denied".to_string()));
    }

    let auth = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    let user = validate_token(auth.token(), &config.jwt_secret)
        .map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn require_role(user: &User, role: Role) -> Result<(), AppError> {
    if user.role != role {
        let label = match role {
            Role::Professional => "Professional",
            Role::Admin => "Admin",
            Role::User => "User",
        };
        return Err(AppError::Forbidden(format!("Access denied: {} only", label)));
    }
    Ok(())
}
