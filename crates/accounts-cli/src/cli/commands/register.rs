//! Interactive sign-up.
//!
//! `:email` at the code prompt returns to the email step; `:back` at the
//! first-name prompt abandons the details and starts over with a new code.

use std::io::{BufRead, Write};

use accounts_core::validate::Field;
use accounts_core::workflows::{Registration, RegistrationStep};
use anyhow::Result;

use super::{App, Prompt, recover};

const CHANGE_EMAIL: &str = ":email";
const BACK: &str = ":back";

const DETAIL_FIELDS: [(Field, &str); 6] = [
    (Field::LastName, "Last name"),
    (Field::Password, "Password"),
    (Field::ConfirmPassword, "Confirm password"),
    (Field::Phone, "Phone (optional)"),
    (Field::DateOfBirth, "Date of birth (optional)"),
    (Field::Address, "Address (optional)"),
];

pub async fn run(app: &App) -> Result<()> {
    let mut registration = Registration::new(app.api.clone(), app.session.clone());
    let mut prompt = Prompt::stdio();
    drive(&mut registration, &mut prompt).await?;

    println!("✓ Account created. You are signed in.");
    Ok(())
}

async fn drive<R: BufRead, W: Write>(
    registration: &mut Registration,
    prompt: &mut Prompt<R, W>,
) -> Result<()> {
    let mut shown = None;
    loop {
        let step = registration.step().clone();
        if shown != Some(step.name()) {
            prompt.say(&format!("\n{}\n{}", step.title(), step.subtitle()))?;
            shown = Some(step.name());
        }

        match step {
            RegistrationStep::AwaitingEmail => {
                let email = prompt.ask("Email")?;
                registration.set_field(Field::Email, email.trim());
                registration.touch(Field::Email);
                if recover(registration.submit_email().await)?.is_some() {
                    let sent_to = registration.draft().email.clone();
                    prompt.say(&format!("Code sent to {sent_to}"))?;
                }
            }
            RegistrationStep::AwaitingCode { .. } => {
                let code = prompt.ask("Code")?;
                if code.trim() == CHANGE_EMAIL {
                    registration.change_email()?;
                    continue;
                }
                registration.set_field(Field::Code, code.trim());
                registration.touch(Field::Code);
                recover(registration.submit_code().await)?;
            }
            RegistrationStep::AwaitingDetails { .. } => {
                let first_name = prompt.ask("First name")?;
                if first_name.trim() == BACK {
                    registration.back()?;
                    continue;
                }
                registration.set_field(Field::FirstName, first_name);
                registration.touch(Field::FirstName);
                for (field, label) in DETAIL_FIELDS {
                    let value = prompt.ask(label)?;
                    registration.set_field(field, value);
                    registration.touch(field);
                }
                if recover(registration.submit_details().await)?.is_some() {
                    return Ok(());
                }
            }
            RegistrationStep::Completed => return Ok(()),
        }
    }
}
