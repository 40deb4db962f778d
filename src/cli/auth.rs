use crate::{cli, config::Settings, success, warning};

/// Runs the browser login and stores the resulting credential.
pub async fn auth(settings: &Settings) {
    let mut app = cli::connect(settings);

    match app.lifecycle.authenticate().await {
        Ok(()) => {
            app.drain_notices();
            success!("Authentication successful!");
            cli::print_snapshot(&app.sync.snapshot());
        }
        Err(e) => {
            app.drain_notices();
            warning!("Authentication failed: {}", e);
        }
    }
}
