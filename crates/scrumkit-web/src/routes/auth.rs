//! Sign-in route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use scrumkit_core::auth::{Credentials, OAuthIdentity, Session, UserProfile};

use crate::error::{ApiResult, api_error, not_found};
use crate::extract::CurrentUser;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let session = state
        .auth
        .sign_up(&req.email, &req.password, &req.display_name)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<Json<Session>> {
    let session = state
        .auth
        .sign_in(&req.email, &req.password)
        .await
        .map_err(api_error)?;
    Ok(Json(session))
}

pub async fn sign_in_with_oauth(
    State(state): State<AppState>,
    Json(req): Json<OAuthIdentity>,
) -> ApiResult<Json<Session>> {
    let session = state.auth.sign_in_with_oauth(&req).await.map_err(api_error)?;
    Ok(Json(session))
}

pub async fn sign_out(State(state): State<AppState>, CurrentUser(session): CurrentUser) -> StatusCode {
    state.auth.sign_out(&session.token).await;
    StatusCode::NO_CONTENT
}

pub async fn me(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<UserProfile>> {
    let profile = state
        .auth
        .get_profile(user.uid())
        .await
        .map_err(api_error)?
        .ok_or_else(|| not_found("Profile", user.uid()))?;
    Ok(Json(profile))
}
