//! Account commands.

use accounts_core::profile::{ProfileDraft, UserProfile};
use accounts_core::validate::Field;
use accounts_core::workflows::AccountView;
use anyhow::Result;

use super::App;

const NOT_SIGNED_IN: &str = "Not signed in. Run `accounts login` first.";

/// Fields accepted by `account edit`.
#[derive(clap::Args, Debug, Default)]
pub struct EditArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    /// Date of birth
    #[arg(long)]
    pub dob: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
}

impl EditArgs {
    /// Flag values paired with [`ProfileDraft::EDITABLE`], in order.
    fn changes(self) -> Vec<(Field, String)> {
        let values = [
            self.first_name,
            self.last_name,
            self.phone,
            self.dob,
            self.address,
        ];
        ProfileDraft::EDITABLE
            .into_iter()
            .zip(values)
            .filter_map(|(field, value)| value.map(|value| (field, value)))
            .collect()
    }
}

/// Loads the profile, turning a redirect into a sign-in hint.
async fn open(app: &App) -> Result<AccountView> {
    let mut view = AccountView::new(app.api.clone(), app.session.clone());
    if view.load().await?.is_some() {
        anyhow::bail!(NOT_SIGNED_IN);
    }
    Ok(view)
}

fn print_profile(profile: &UserProfile) {
    println!("Name:          {}", profile.full_name());
    println!("Email:         {}", profile.email);
    if let Some(phone) = profile.phone() {
        println!("Phone:         {phone}");
    }
    if let Some(dob) = profile.dob() {
        println!("Date of birth: {dob}");
    }
    if let Some(address) = profile.address() {
        println!("Address:       {address}");
    }
}

pub async fn show(app: &App) -> Result<()> {
    let view = open(app).await?;
    if let Some(profile) = view.profile() {
        print_profile(profile);
    }
    Ok(())
}

pub async fn edit(app: &App, args: EditArgs) -> Result<()> {
    let changes = args.changes();
    if changes.is_empty() {
        anyhow::bail!("Nothing to update. Pass at least one field flag (see --help).");
    }

    let mut view = open(app).await?;
    view.begin_edit();
    for (field, value) in changes {
        view.set_field(field, value);
        view.touch(field);
    }

    if let Err(err) = view.save().await {
        if err.redirect().is_some() {
            anyhow::bail!(NOT_SIGNED_IN);
        }
        return Err(err.into());
    }

    println!("✓ Account updated");
    if let Some(profile) = view.profile() {
        print_profile(profile);
    }
    Ok(())
}
