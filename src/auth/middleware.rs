use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::store::RecordStore;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;
use tracing::{debug, error};

/// Verifies the bearer token and attaches the caller, looked up once in the
/// account table named by the token.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;
    let store = req
        .app_data::<Data<dyn RecordStore>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Record store missing"))?;

    let header_value = match req.headers().get("Authorization") {
        Some(h) => h.to_str().map_err(|_| {
            actix_web::error::ErrorUnauthorized(
                json!({"message": "Invalid Authorization header encoding"}),
            )
        })?,
        None => {
            let resp = HttpResponse::Unauthorized().json(json!({"message": "Tidak ada token"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let token = match header_value.strip_prefix("Bearer ") {
        Some(t) => t,
        None => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"message": "Authorization header must start with Bearer"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "Rejected token");
            let resp = HttpResponse::Unauthorized()
                .json(json!({"message": "Token tidak valid", "details": e}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let identity = match store.find_identity(claims.kind, claims.user_id).await {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            let resp =
                HttpResponse::Unauthorized().json(json!({"message": "User tidak ditemukan"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
        Err(e) => {
            error!(error = %e, user_id = claims.user_id, kind = %claims.kind, "Identity lookup failed");
            let resp = HttpResponse::InternalServerError()
                .json(json!({"message": "Internal Server Error"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    debug!(
        user_id = identity.id(),
        kind = %identity.kind(),
        name = identity.name(),
        "Authenticated"
    );
    req.extensions_mut().insert(AuthUser { identity });

    next.call(req).await
}
