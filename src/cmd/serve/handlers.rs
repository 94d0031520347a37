// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use lexicards_core::Card;
use lexicards_core::CardId;
use lexicards_core::CardInput;
use lexicards_core::EngineError;
use lexicards_core::Rating;
use lexicards_core::Stats;
use lexicards_core::Timestamp;
use lexicards_core::UserId;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::cmd::serve::error::ApiError;
use crate::cmd::serve::server::ServerState;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize)]
pub struct UserParams {
    user: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    user: Option<String>,
    q: Option<String>,
}

#[derive(Serialize)]
pub struct HealthBody {
    status: &'static str,
}

fn user_of(user: Option<String>) -> ApiResult<UserId> {
    Ok(UserId::new(user.unwrap_or_default())?)
}

fn card_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<CardId> {
    match path {
        Ok(Path(id)) => Ok(CardId::new(id)),
        Err(e) => Err(ApiError::BadRequest(e.body_text())),
    }
}

/// Decode a JSON body, reporting a body that does not decode as `invalid`.
fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
    invalid: impl FnOnce(String) -> EngineError,
) -> ApiResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(e) => Err(invalid(e.body_text()).into()),
    }
}

pub async fn health_handler() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

pub async fn create_handler(
    State(state): State<ServerState>,
    Query(params): Query<UserParams>,
    body: Result<Json<CardInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Card>)> {
    let user = user_of(params.user)?;
    let input = json_body(body, EngineError::InvalidCardData)?;
    let card = state.engine.create_card(&user, input, Timestamp::now())?;
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn due_handler(
    State(state): State<ServerState>,
    Query(params): Query<UserParams>,
) -> ApiResult<Json<Vec<Card>>> {
    let user = user_of(params.user)?;
    Ok(Json(state.engine.get_due_cards(&user, Timestamp::now())?))
}

pub async fn stats_handler(
    State(state): State<ServerState>,
    Query(params): Query<UserParams>,
) -> ApiResult<Json<Stats>> {
    let user = user_of(params.user)?;
    Ok(Json(state.engine.get_stats(&user, Timestamp::now())?))
}

pub async fn search_handler(
    State(state): State<ServerState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Card>>> {
    let user = user_of(params.user)?;
    let query = params.q.unwrap_or_default();
    Ok(Json(state.engine.search_similar(&user, &query)?))
}

pub async fn get_card_handler(
    State(state): State<ServerState>,
    Query(params): Query<UserParams>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Card>> {
    let user = user_of(params.user)?;
    let id = card_id(path)?;
    Ok(Json(state.engine.get_card(&user, id)?))
}

pub async fn delete_card_handler(
    State(state): State<ServerState>,
    Query(params): Query<UserParams>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let user = user_of(params.user)?;
    let id = card_id(path)?;
    state.engine.delete_card(&user, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn answer_handler(
    State(state): State<ServerState>,
    Query(params): Query<UserParams>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Card>> {
    let user = user_of(params.user)?;
    let id = card_id(path)?;
    let body = json_body(body, EngineError::InvalidRating)?;
    let rating = Rating::try_from(body.get("rating").unwrap_or(&Value::Null))?;
    Ok(Json(
        state.engine.answer_card(&user, id, rating, Timestamp::now())?,
    ))
}

pub async fn delete_user_handler(
    State(state): State<ServerState>,
    Path(user): Path<String>,
) -> ApiResult<StatusCode> {
    let user = user_of(Some(user))?;
    if state.engine.delete_user(&user)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

pub async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}
