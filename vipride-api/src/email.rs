use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use vipride_core::notification::{EmailBody, EmailMessage};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub to: String,
    pub name: Option<String>,
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub message: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/send-email", post(send_email))
}

/// POST /api/send-email
async fn send_email(
    State(state): State<AppState>,
    Json(req): Json<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>, AppError> {
    if req.to.trim().is_empty() {
        return Err(AppError::ValidationError("Recipient is required".to_string()));
    }

    let body = match (req.html, req.text) {
        (Some(html), _) if !html.trim().is_empty() => EmailBody::Html(html),
        (_, Some(text)) if !text.trim().is_empty() => EmailBody::Text(text),
        _ => return Err(AppError::ValidationError("Email body is required".to_string())),
    };

    let message = EmailMessage {
        to: req.to.trim().to_string(),
        to_name: req.name.filter(|n| !n.trim().is_empty()),
        subject: req.subject,
        body,
    };

    state.mailer.send(&message).await?;

    Ok(Json(SendEmailResponse {
        message: "Email sent successfully".to_string(),
    }))
}
