pub mod pages;

use std::path::Path;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tower_http::services::ServeDir;

use crate::network::Producer;

#[derive(Debug, Clone)]
pub struct WebState {
    pub producer: Producer,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmissionForm {
    pub username: Option<String>,
    pub message: Option<String>,
}

pub fn router<P: AsRef<Path>>(producer: Producer, static_dir: P) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/message", get(message_form).post(submit_message))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .fallback(not_found)
        .with_state(WebState { producer })
}

async fn index() -> Html<String> {
    Html(pages::index())
}

async fn message_form() -> Html<String> {
    Html(pages::message_form(false))
}

async fn submit_message(
    State(state): State<WebState>,
    Form(form): Form<SubmissionForm>,
) -> Response {
    match state.producer.submit(form.username, form.message).await {
        Ok(_) => Html(pages::message_form(true)).into_response(),
        Err(err) => {
            log::error!("Submission failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pages::submission_failed()),
            )
                .into_response()
        }
    }
}

async fn not_found() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html(pages::not_found()))
}
