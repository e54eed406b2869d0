use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

/// Validates the bearer token and stores the resolved `AuthUser` in the
/// request extensions for the handlers of protected scopes.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?
        .clone();

    let header_value = match req.headers().get("Authorization") {
        Some(h) => match h.to_str() {
            Ok(v) => v.to_owned(),
            Err(_) => {
                let resp = HttpResponse::Unauthorized()
                    .json(json!({"error": "UNAUTHORIZED", "message": "Invalid Authorization header encoding"}));
                return Ok(req.into_response(resp));
            }
        },
        None => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"error": "UNAUTHORIZED", "message": "Missing Authorization header"}));
            return Ok(req.into_response(resp));
        }
    };

    let Some(token) = header_value.strip_prefix("Bearer ") else {
        let resp = HttpResponse::Unauthorized()
            .json(json!({"error": "UNAUTHORIZED", "message": "Authorization header must start with Bearer"}));
        return Ok(req.into_response(resp));
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            let resp = HttpResponse::Unauthorized()
                .json(json!({"error": "UNAUTHORIZED", "message": "Invalid or expired token"}));
            return Ok(req.into_response(resp));
        }
    };

    req.extensions_mut().insert(AuthUser {
        subject: claims.sub,
        role: claims.role,
    });

    next.call(req).await
}
