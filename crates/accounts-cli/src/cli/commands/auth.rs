//! Sign-in, sign-out and identity commands.

use accounts_core::validate::Field;
use accounts_core::workflows::{LoginForm, NavBar};
use anyhow::Result;

use super::{App, Prompt};

pub async fn login(app: &App, email: Option<String>, password: Option<String>) -> Result<()> {
    let mut prompt = Prompt::stdio();
    let email = match email {
        Some(email) => email,
        None => prompt.ask("Email")?,
    };
    let password = match password {
        Some(password) => password,
        None => prompt.ask("Password")?,
    };

    let mut form = LoginForm::new(app.api.clone(), app.session.clone());
    form.set_email(email.trim());
    form.set_password(password);
    form.touch(Field::Email);
    form.touch(Field::Password);

    form.submit().await?;

    println!("✓ Signed in as {}", form.email());
    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    let was_signed_in = app.session.is_authenticated();
    let mut bar = NavBar::new(app.api.clone(), app.session.clone());
    bar.logout()?;

    if was_signed_in {
        println!("✓ Signed out");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

pub async fn whoami(app: &App) -> Result<()> {
    let mut bar = NavBar::new(app.api.clone(), app.session.clone());
    bar.bootstrap().await?;

    match (bar.greeting(), bar.user()) {
        (Some(greeting), Some(user)) => {
            println!("{greeting}");
            println!("{}", user.email);
        }
        _ => println!("Not signed in."),
    }
    Ok(())
}
