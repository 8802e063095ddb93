use anyhow::{Result, bail};
use sea_orm::Database;
use std::fmt;
use std::sync::Arc;

use crate::auth::JwtVerifier;
use crate::schemas::AppState;

/// Runtime settings collected from the command line and the environment.
#[derive(Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub jwt_secret: String,
    /// Reminders target installments due this many days after today
    pub reminder_days_ahead: i64,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("database_url", &self.database_url)
            .field("bind_address", &self.bind_address)
            .field("jwt_secret", &"<redacted>")
            .field("reminder_days_ahead", &self.reminder_days_ahead)
            .finish()
    }
}

/// Connect to the database and build the state shared by every handler
pub async fn initialize_app_state(settings: Settings) -> Result<AppState> {
    if settings.jwt_secret.trim().is_empty() {
        bail!("JWT secret must not be empty");
    }
    if settings.reminder_days_ahead < 0 {
        bail!("Reminder lead time cannot be negative");
    }

    tracing::info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    let verifier = JwtVerifier::new(settings.jwt_secret.as_bytes());

    Ok(AppState {
        db,
        verifier: Arc::new(verifier),
        settings: Arc::new(settings),
    })
}
