//! Session commands.

use super::{App, CliError, say};

/// Show the stored profile and whether a token is held.
pub fn show(app: &App) {
    match app.session.profile() {
        Some(profile) => {
            say(format!("user:     {}", profile.id));
            if let Some(name) = &profile.name {
                say(format!("name:     {name}"));
            }
            if let Some(email) = &profile.email {
                say(format!("email:    {email}"));
            }
            if let Some(business_id) = &profile.business_id {
                say(format!("business: {business_id}"));
            }
        }
        None => say("No user profile stored."),
    }
    say(if app.session.token().is_some() {
        "token:    stored"
    } else {
        "token:    none"
    });
    say(format!("state:    {}", app.config.state_dir.display()));
}

/// Forget the stored token and profile.
///
/// # Errors
///
/// Returns an error if the stored files cannot be removed.
pub fn clear(app: &mut App) -> Result<(), CliError> {
    app.session.clear()?;
    app.client.set_token(None);
    say("Session cleared.");
    Ok(())
}
