//! The status endpoints and their toggle protocol.

use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;

use crate::http::AppState;
use crate::observer::{Context, Logger};

/// Write `code` with its canonical reason text as the body and log
/// the outcome at a severity derived from the code's class.
fn respond(state: &AppState, cx: &Context, code: StatusCode) -> Response {
    let text = code.canonical_reason().unwrap_or("Unknown Status");
    match code.as_u16() {
        400..=499 => state.observer.info(cx, &format!("request failed: {text}")),
        500..=599 => state.observer.error(cx, &format!("server error: {text}")),
        _ => state.observer.debug(cx, "request successful"),
    }
    (code, format!("{text}\n")).into_response()
}

/// `GET /status`: the current code, randomized while flaky.
pub async fn status(
    State(state): State<AppState>,
    Extension(cx): Extension<Context>,
    method: Method,
) -> Response {
    if method != Method::GET {
        return respond(&state, &cx, StatusCode::METHOD_NOT_ALLOWED);
    }

    let (code, _delay) = state.store.read().await;
    // Every stored code is legal, so the conversion cannot fail.
    let code = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    respond(&state, &cx, code)
}

/// `POST /status/{code}`: set the fixed code. 202 when the value
/// changed, 200 when it was already set, 400 for anything illegal.
pub async fn set_status(
    State(state): State<AppState>,
    Extension(cx): Extension<Context>,
    method: Method,
    Path(code): Path<String>,
) -> Response {
    if method != Method::POST {
        return respond(&state, &cx, StatusCode::METHOD_NOT_ALLOWED);
    }

    let Ok(candidate) = code.parse::<u16>() else {
        return respond(&state, &cx, StatusCode::BAD_REQUEST);
    };

    match state.store.set(candidate) {
        Ok(true) => respond(&state, &cx, StatusCode::ACCEPTED),
        Ok(false) => respond(&state, &cx, StatusCode::OK),
        Err(e) => {
            state.observer.info(&cx, &e.to_string());
            respond(&state, &cx, StatusCode::BAD_REQUEST)
        }
    }
}

/// `POST /flaky`: toggle randomized reads. Always 202; flaky mode
/// takes precedence over the fixed code while enabled.
pub async fn flaky(
    State(state): State<AppState>,
    Extension(cx): Extension<Context>,
    method: Method,
) -> Response {
    if method != Method::POST {
        return respond(&state, &cx, StatusCode::METHOD_NOT_ALLOWED);
    }

    state.store.toggle_flaky();
    respond(&state, &cx, StatusCode::ACCEPTED)
}
