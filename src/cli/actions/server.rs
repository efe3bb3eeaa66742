use crate::{
    api::{self, email::LogEmailSender, AppState},
    auth::TokenService,
    cli::{actions::Action, globals::GlobalArgs},
    otp::{OtpService, OtpStore},
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    let Action::Server {
        port,
        dsn,
        redis_url,
        environment,
        jwt_secret,
    } = action;

    let globals = GlobalArgs::new(environment, jwt_secret);
    info!("Starting in {} environment", globals.environment);

    let tokens = TokenService::new(&globals.jwt_secret);

    let store = match redis_url {
        Some(url) => OtpStore::connect(&url).await?,
        None => {
            // Codes vanish on restart; acceptable for local development only.
            warn!("No Redis URL configured, using in-memory OTP cache");
            OtpStore::memory()
        }
    };
    let otp = OtpService::new(store);

    let state = AppState {
        tokens,
        otp,
        email: Arc::new(LogEmailSender),
    };

    api::new(port, dsn, state).await?;

    Ok(())
}
