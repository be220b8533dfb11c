use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use storekeep_auth::{
    hash_password, normalize_email, verify_password, NewUser, PasswordError, ResetToken,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CurrentUser;

/// Public endpoints: credentials in, token out.
pub fn public_router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// Endpoints behind the auth middleware.
pub fn protected_router() -> Router {
    Router::new().route("/me", get(me))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    let password_hash = match hash_password(&body.password, services.bcrypt_cost) {
        Ok(hash) => hash,
        Err(e @ PasswordError::TooShort(_)) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
        }
        Err(e) => {
            tracing::error!(error = %e, "password hashing failed");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "hash_error",
                "registration failed",
            );
        }
    };

    let new_user = match NewUser::new(
        &body.name,
        &body.email,
        password_hash,
        body.role.unwrap_or_default(),
    ) {
        Ok(new_user) => new_user,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
        }
    };

    match services.store.find_user_by_email(&new_user.email).await {
        Ok(Some(_)) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "email_taken",
                "e-mail already registered",
            );
        }
        Ok(None) => {}
        Err(e) => return errors::store_error_to_response(e),
    }

    let user = match services.store.create_user(&new_user).await {
        Ok(user) => user,
        Err(e) => return errors::store_error_to_response(e),
    };

    let token = match services.issue_token(&user, Utc::now()) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "token issuance failed");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_error",
                "registration failed",
            );
        }
    };

    (
        StatusCode::CREATED,
        Json(dto::auth_to_json(token, &user.profile())),
    )
        .into_response()
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let email = normalize_email(&body.email);
    let user = match services.store.find_user_by_email(&email).await {
        Ok(user) => user,
        Err(e) => return errors::store_error_to_response(e),
    };

    // One rejection path for unknown account and wrong password; the
    // response must not reveal which one it was.
    let Some(user) = user else {
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid e-mail or password",
        );
    };
    if !verify_password(&body.password, &user.password_hash) {
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid e-mail or password",
        );
    }

    if let Some(expected) = body.role {
        if user.role != expected {
            return errors::json_error(StatusCode::FORBIDDEN, "role_mismatch", "role mismatch");
        }
    }

    match services.issue_token(&user, Utc::now()) {
        Ok(token) => {
            (StatusCode::OK, Json(dto::auth_to_json(token, &user.profile()))).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "token issuance failed");
            errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_error",
                "login failed",
            )
        }
    }
}

pub async fn forgot_password(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ForgotPasswordRequest>,
) -> axum::response::Response {
    let email = normalize_email(&body.email);
    let user = match services.store.find_user_by_email(&email).await {
        Ok(user) => user,
        Err(e) => return errors::store_error_to_response(e),
    };

    // Unknown accounts get the same answer as known ones (no enumeration).
    let Some(user) = user else {
        return (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "if the e-mail exists, a reset link has been generated",
            })),
        )
            .into_response();
    };

    let token = ResetToken::issue(user.id, Utc::now());
    if let Err(e) = services.store.create_reset_token(&token).await {
        return errors::store_error_to_response(e);
    }

    // Delivery is out of scope; the link rides back in the payload.
    let reset_link = format!(
        "{}/reset-password?token={}",
        services.frontend_url, token.token
    );
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "reset link generated",
            "reset_link": reset_link,
        })),
    )
        .into_response()
}

pub async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ResetPasswordRequest>,
) -> axum::response::Response {
    let password_hash = match hash_password(&body.new_password, services.bcrypt_cost) {
        Ok(hash) => hash,
        Err(e @ PasswordError::TooShort(_)) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
        }
        Err(e) => {
            tracing::error!(error = %e, "password hashing failed");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "hash_error",
                "password reset failed",
            );
        }
    };

    let redeemed = match services.store.redeem_reset_token(body.token, Utc::now()).await {
        Ok(redeemed) => redeemed,
        Err(e) => return errors::store_error_to_response(e),
    };
    let Some(redeemed) = redeemed else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_token",
            "invalid or expired token",
        );
    };

    if let Err(e) = services
        .store
        .update_password(redeemed.user_id, &password_hash)
        .await
    {
        return errors::store_error_to_response(e);
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({ "message": "password updated" })),
    )
        .into_response()
}

pub async fn me(Extension(user): Extension<CurrentUser>) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "user": user.profile() })),
    )
        .into_response()
}
