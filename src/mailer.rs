//! Transactional email for the forgot-password flow
//! (`POST /auth/forgot-password`). Absent an `SmtpConfig` (no SMTP_* vars
//! set, the common dev-mode case), the reset link is logged instead of
//! mailed so the flow is still exercisable locally.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

pub async fn send_password_reset_email(
    smtp: Option<&SmtpConfig>,
    to_email: &str,
    reset_url: &str,
) -> Result<(), String> {
    let Some(smtp) = smtp else {
        tracing::info!(email = %to_email, reset_url, "SMTP not configured; logging reset link instead of mailing it");
        return Ok(());
    };

    let message = Message::builder()
        .from(smtp.from_address.parse().map_err(|e| format!("invalid from address: {e}"))?)
        .to(to_email.parse().map_err(|e| format!("invalid recipient address: {e}"))?)
        .subject("Reset your password")
        .header(ContentType::TEXT_PLAIN)
        .body(format!(
            "Use the link below to reset your password. It expires in one hour.\n\n{reset_url}\n"
        ))
        .map_err(|e| format!("failed to build message: {e}"))?;

    let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
    let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
        .map_err(|e| format!("failed to build SMTP transport: {e}"))?
        .port(smtp.port)
        .credentials(creds)
        .build();

    transport
        .send(message)
        .await
        .map_err(|e| format!("failed to send email: {e}"))?;
    Ok(())
}
