// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{MessageWrittenResponse, WriteMessageRequest},
    state::ChatState,
};

/// Append a message to a chat as the session user.
#[utoipa::path(
    post,
    path = "/chat/write",
    tag = "Messages",
    request_body = WriteMessageRequest,
    responses(
        (status = 200, description = "Message stored", body = MessageWrittenResponse),
        (status = 400, description = "Empty text or chat not found"),
        (status = 401, description = "Missing or malformed session"),
        (status = 403, description = "Not a participant, or expired session")
    )
)]
pub async fn write_message(
    State(state): State<ChatState>,
    Auth(session): Auth,
    payload: Result<Json<WriteMessageRequest>, JsonRejection>,
) -> Result<Json<MessageWrittenResponse>, ApiError> {
    let Json(request) = payload?;
    let message = state
        .chats
        .write_message(&session, &request.chat_name, request.id, &request.text)
        .await?;

    Ok(Json(MessageWrittenResponse {
        message: "You have successfully written a message!".to_string(),
        id: message.id,
    }))
}
