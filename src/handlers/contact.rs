use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::dtos::auth_dtos::MessageResponse;
use crate::dtos::chat_dtos::ContactRequest;
use crate::errors::Result;
use crate::services::email_service::EmailMessage;
use crate::state::AppState;

// POST /api/contact
pub async fn contact_form(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> Result<Response> {
    if [&req.name, &req.email, &req.message]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                success: false,
                message: "All fields are required".to_string(),
            }),
        )
            .into_response());
    }

    let email = EmailMessage {
        subject: format!("New Contact Form Message from {}", req.name),
        body: format!(
            "Name: {}\nEmail: {}\nMessage: {}\nThis message was sent from the ChatBot contact form.",
            req.name, req.email, req.message
        ),
        from: state.from_email.clone(),
        to: vec![state.contact_email.clone()],
    };
    state.mailer.send(&email).await?;

    Ok(Json(MessageResponse::ok("Message sent successfully!")).into_response())
}
