// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{any::Any, time::Duration};

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    api::health::{HealthChecks, HealthResponse, ReadyResponse},
    auth::require_session,
    error::ApiError,
    models::{
        ChatCreatedResponse, ChatView, CurrentUserResponse, LoginRequest, LoginResponse,
        MakeChatRequest, MessageResponse, MessageView, MessageWrittenResponse, RegisterRequest,
        UserProfile, UserResponse, WriteMessageRequest,
    },
    state::{ChatState, IdentityState},
};

pub mod chats;
pub mod health;
pub mod messages;
pub mod users;

/// Routes of the identity service.
///
/// Registration, login and health are public; profile lookups require a
/// session cookie.
pub fn identity_router(state: IdentityState, request_timeout: Duration) -> Router {
    let gated = Router::new()
        .route("/chat/{username}", get(users::get_user))
        .route("/users/me", get(users::current_user))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            require_session,
        ));

    let open = Router::new()
        .route("/chat/register", post(users::register))
        .route("/chat/login", post(users::login))
        .route("/health", get(health::identity_health))
        .route("/health/live", get(health::liveness));

    let routes = open.merge(gated).with_state(state);

    with_http_layers(
        Router::new()
            .merge(routes)
            .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", IdentityApiDoc::openapi())),
        request_timeout,
    )
}

/// Routes of the chat service. Everything except health requires a session.
pub fn chat_router(state: ChatState, request_timeout: Duration) -> Router {
    let gated = Router::new()
        .route("/chat/make", post(chats::make_chat))
        .route("/chat/write", post(messages::write_message))
        .route("/chat/{chat_name}/{id}", get(chats::get_chat))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            require_session,
        ));

    let open = Router::new()
        .route("/health", get(health::chat_health))
        .route("/health/live", get(health::liveness));

    let routes = open.merge(gated).with_state(state);

    with_http_layers(
        Router::new()
            .merge(routes)
            .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ChatApiDoc::openapi())),
        request_timeout,
    )
}

/// Panic recovery, request deadline, CORS, request ids and tracing spans
/// shared by both services.
fn with_http_layers(router: Router, request_timeout: Duration) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// A handler panicked: log it and answer like any other internal error.
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    ApiError::internal(format!("handler panicked: {detail}")).into_response()
}

#[derive(OpenApi)]
#[openapi(
    paths(
        users::register,
        users::login,
        users::get_user,
        users::current_user,
        health::identity_health,
        health::liveness
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            MessageResponse,
            UserProfile,
            UserResponse,
            CurrentUserResponse,
            ReadyResponse,
            HealthChecks,
            HealthResponse
        )
    ),
    tags(
        (name = "Identity", description = "Registration, login and profiles"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct IdentityApiDoc;

#[derive(OpenApi)]
#[openapi(
    paths(
        chats::make_chat,
        chats::get_chat,
        messages::write_message,
        health::chat_health,
        health::liveness
    ),
    components(
        schemas(
            MakeChatRequest,
            ChatCreatedResponse,
            ChatView,
            MessageView,
            WriteMessageRequest,
            MessageWrittenResponse,
            ReadyResponse,
            HealthChecks,
            HealthResponse
        )
    ),
    tags(
        (name = "Chats", description = "Chat creation and reads"),
        (name = "Messages", description = "Writing messages"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ChatApiDoc;
