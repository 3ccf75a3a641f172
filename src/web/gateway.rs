//! Command handler: one inbound command, one portal operation.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use tracing::{info, instrument};

use crate::portal::{GradesOutcome, PortalClient};
use crate::state::AppState;
use crate::web::command::{Command, GetGradesCommand, LoginCommand};
use crate::web::envelope::Envelope;
use crate::web::error::GatewayError;

/// `POST /` and `POST /api`: decode the command and run it against a
/// fresh portal session.
#[instrument(skip_all)]
pub async fn dispatch(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let command = Command::decode(&body)?;
    info!(action = command.action(), "Dispatching command");

    let client = PortalClient::new(&state.portal)?;
    match command {
        Command::InitLogin => init_login(&client).await,
        Command::Login(cmd) => login(&client, cmd).await,
        Command::GetGrades(cmd) => get_grades(&client, cmd).await,
    }
}

async fn init_login(client: &PortalClient) -> Result<Response, GatewayError> {
    let page = client.fetch_login_page().await?;
    Ok(Json(Envelope::success(page)).into_response())
}

async fn login(client: &PortalClient, cmd: LoginCommand) -> Result<Response, GatewayError> {
    client.set_cookies(&cmd.cookies);

    let outcome = client
        .attempt_login(
            &cmd.username,
            &cmd.password,
            &cmd.captcha_code,
            &cmd.view_state_data,
        )
        .await?;

    if !outcome.success {
        return Err(GatewayError::LoginRejected(outcome.message));
    }

    Ok(Json(
        Envelope::ok()
            .with_cookies(outcome.cookies)
            .with_message(outcome.message),
    )
    .into_response())
}

async fn get_grades(
    client: &PortalClient,
    cmd: GetGradesCommand,
) -> Result<Response, GatewayError> {
    client.set_cookies(&cmd.cookies);

    match client.fetch_grades_data().await? {
        GradesOutcome::Grades(report) => Ok(Json(
            Envelope::success(report).with_cookies(client.cookies()),
        )
        .into_response()),
        GradesOutcome::SessionExpired => Err(GatewayError::SessionExpired),
    }
}
