use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{
        normalize_email, LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest,
        UserEnvelope,
    },
    repo::NewUser,
};
use crate::{
    auth::{
        password::{hash_password, verify_dummy, verify_password},
        AuthError, CurrentUser,
    },
    db::StoreError,
    error::ApiError,
    state::UserServiceState,
};

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<UserServiceState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserEnvelope>), ApiError> {
    let Json(payload) = payload?;
    let payload = payload.validated()?;

    let password_hash = hash_password(&payload.password)
        .map_err(|e| ApiError::upstream("could not hash password", e))?;

    let user = match state
        .users
        .insert(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
        })
        .await
    {
        Ok(u) => u,
        Err(StoreError::Conflict(constraint)) => {
            warn!(%constraint, "registration conflict");
            return Err(ApiError::Conflict(
                "username or email is already in use".into(),
            ));
        }
        Err(e) => return Err(ApiError::upstream("could not create user", e)),
    };

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            message: Some("user created"),
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<UserServiceState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;
    let payload = payload.validated()?;

    let user = match state.users.find_by_username(&payload.username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(username = %payload.username, "login for unknown username");
            verify_dummy(&payload.password);
            return Err(AuthError::BadCredentials.into());
        }
        Err(e) => return Err(ApiError::upstream("could not load user", e)),
    };

    let ok = verify_password(&payload.password, &user.password_hash)
        .map_err(|e| ApiError::upstream("could not verify password", e))?;
    if !ok {
        warn!(user_id = user.id, "login with wrong password");
        return Err(AuthError::BadCredentials.into());
    }

    let token = state
        .jwt
        .issue(user.id, &user.username)
        .map_err(|e| ApiError::upstream("could not issue token", e))?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip_all)]
pub async fn get_profile(CurrentUser(user): CurrentUser) -> Json<UserEnvelope> {
    Json(UserEnvelope {
        message: None,
        user: user.into(),
    })
}

#[instrument(skip_all)]
pub async fn update_profile(
    State(state): State<UserServiceState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let Json(payload) = payload?;

    // An absent or blank email leaves the profile as it is.
    let requested = payload.email.filter(|e| !e.trim().is_empty());
    let user = match requested {
        None => user,
        Some(raw) => {
            let email = normalize_email(&raw)?;
            match state.users.update_email(user.id, &email).await {
                Ok(Some(updated)) => updated,
                Ok(None) => return Err(AuthError::UnknownUser.into()),
                Err(StoreError::Conflict(_)) => {
                    return Err(ApiError::Conflict("email is already in use".into()))
                }
                Err(e) => return Err(ApiError::upstream("could not update profile", e)),
            }
        }
    };

    info!(user_id = user.id, "profile updated");
    Ok(Json(UserEnvelope {
        message: Some("profile updated"),
        user: user.into(),
    }))
}
