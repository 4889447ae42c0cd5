//! Interactive access flow for private catalogues.
//!
//! Collects a name and an email or phone (from flags or prompts), asks the
//! server to send a one-time code, then prompts for the code. Typing `back`
//! at the code prompt returns to the contact step. Wrong codes can be retried
//! as often as needed.

use vitrine_client::{ClientError, ErrorKind};
use vitrine_core::{AccessRequestForm, AccessState};

use super::{App, CliError, Prompter, say};

const BACK: &str = "back";

/// Run the access flow for `slug`.
///
/// # Errors
///
/// Returns an error if the catalogue cannot be loaded, the server cannot be
/// reached, or input ends before access is granted.
pub async fn run(
    app: &mut App,
    slug: &str,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
) -> Result<(), CliError> {
    let mut view = App::open_view(&app.client, &mut app.session, &app.shutdown, slug).await?;

    if view.gate().state() == AccessState::Hidden {
        say(format!("{} is already open to you.", view.catalogue().name));
        return Ok(());
    }

    say(format!("{} is private. Request access to see its products.", view.catalogue().name));

    let mut prompter = Prompter::new();
    let mut form = AccessRequestForm {
        name: name.unwrap_or_default(),
        email,
        phone,
    };

    loop {
        match view.gate().state() {
            AccessState::Requesting => {
                fill_form(&mut prompter, &mut form).await?;
                match view.request_access(&form).await {
                    Ok(()) => say("A code is on its way. Type `back` to change your details."),
                    Err(ClientError::Access(e)) => {
                        for field in e.field_errors() {
                            say(format!("  {field}"));
                            clear_field(&mut form, field.field);
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::Validation => {
                        say(e.user_message());
                        form.email = None;
                        form.phone = None;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            AccessState::Verifying => {
                let code = prompter.ask("Code").await?.ok_or(CliError::Aborted)?;
                if code.eq_ignore_ascii_case(BACK) {
                    view.back()?;
                    form.email = None;
                    form.phone = None;
                    continue;
                }
                match view.verify(&code).await {
                    Ok(()) => {}
                    Err(e) if matches!(e.kind(), ErrorKind::Validation | ErrorKind::Domain) => {
                        say(view.gate().error().map_or_else(|| e.user_message(), str::to_string));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            AccessState::Granted | AccessState::Hidden => break,
        }
    }

    say(format!("Access granted to {}.", view.catalogue().name));
    say(format!("Run `vitrine catalogue products {slug}` to browse."));
    Ok(())
}

/// Prompt for whatever the form is still missing.
async fn fill_form(prompter: &mut Prompter, form: &mut AccessRequestForm) -> Result<(), CliError> {
    while form.name.trim().is_empty() {
        form.name = prompter.ask("Name").await?.ok_or(CliError::Aborted)?;
    }

    let blank = |v: &Option<String>| v.as_deref().is_none_or(|v| v.trim().is_empty());
    while blank(&form.email) && blank(&form.phone) {
        let email = prompter
            .ask("Email (leave empty to use a phone number)")
            .await?
            .ok_or(CliError::Aborted)?;
        if email.is_empty() {
            form.phone = Some(prompter.ask("Phone").await?.ok_or(CliError::Aborted)?);
        } else {
            form.email = Some(email);
        }
    }
    Ok(())
}

fn clear_field(form: &mut AccessRequestForm, field: &str) {
    match field {
        "name" => form.name.clear(),
        "email" => form.email = None,
        "phone" => form.phone = None,
        _ => {}
    }
}
