// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{ChatCreatedResponse, ChatView, MakeChatRequest},
    state::ChatState,
};

#[utoipa::path(
    post,
    path = "/chat/make",
    tag = "Chats",
    request_body = MakeChatRequest,
    responses(
        (status = 201, description = "Chat created", body = ChatCreatedResponse),
        (status = 400, description = "Invalid name, unknown participant or duplicate chat"),
        (status = 401, description = "Missing or malformed session"),
        (status = 403, description = "Expired or forged session"),
        (status = 409, description = "No participants given")
    )
)]
pub async fn make_chat(
    State(state): State<ChatState>,
    Auth(session): Auth,
    payload: Result<Json<MakeChatRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ChatCreatedResponse>), ApiError> {
    let Json(request) = payload?;
    let chat = state
        .chats
        .create_chat(&session, &request.name, &request.participants)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ChatCreatedResponse {
            message: "You have successfully created a chat!".to_string(),
            name: chat.name,
            id: chat.id,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/chat/{chat_name}/{id}",
    tag = "Chats",
    params(
        ("chat_name" = String, Path, description = "Chat name"),
        ("id" = u64, Path, description = "Chat id")
    ),
    responses(
        (status = 200, description = "Chat with participant nicknames and messages", body = ChatView),
        (status = 400, description = "Chat not found"),
        (status = 401, description = "Missing or malformed session"),
        (status = 403, description = "Not a participant, or expired session")
    )
)]
pub async fn get_chat(
    State(state): State<ChatState>,
    Auth(session): Auth,
    path: Result<Path<(String, u64)>, PathRejection>,
) -> Result<Json<ChatView>, ApiError> {
    let Path((chat_name, id)) = path?;
    let view = state.chats.read_chat(&session, &chat_name, id).await?;
    Ok(Json(view))
}
