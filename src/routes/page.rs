//! Handlers for the health page and its button.

use axum::{
    extract::State,
    response::{Html, Redirect},
};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Render the page from the controller's current state.
#[instrument(name = "page::index", skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let view = state.page.view();

    let mut context = tera::Context::new();
    context.insert("ui", &state.config.ui);
    context.insert("page", &view);

    let html = state.tera.render("index.html", &context)?;
    Ok(Html(html))
}

/// Button press: start a check and send the browser back to the page.
///
/// The controller is `Pending` before the redirect is sent, so the page the
/// browser loads next already shows the disabled button.
#[instrument(name = "page::check", skip(state))]
pub async fn check(State(state): State<AppState>) -> Redirect {
    let ticket = state.page.trigger();
    tracing::info!(
        generation = ticket.generation(),
        url = %state.page.url(),
        "Health check requested"
    );
    Redirect::to("/")
}
