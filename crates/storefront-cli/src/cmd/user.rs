use anyhow::{bail, Context};
use clap::Subcommand;
use std::path::Path;
use storefront_core::user::User;

use crate::output::print_json;

#[derive(Subcommand)]
pub enum UserSubcommand {
    /// Create an administrator account
    CreateAdmin {
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Grant admin rights to an existing user
    Promote { username: String },
    /// Revoke admin rights
    Demote { username: String },
}

pub fn run(root: &Path, subcmd: UserSubcommand, json: bool) -> anyhow::Result<()> {
    let (_, store) = super::open(root)?;
    let user = match subcmd {
        UserSubcommand::CreateAdmin {
            username,
            email,
            password,
        } => {
            let created = User::ensure_admin(&store, &username, &email, &password)
                .with_context(|| format!("failed to create admin '{username}'"))?;
            match created {
                Some(user) => user,
                None => bail!(
                    "user '{username}' already exists\n\
                     Run `storefront user promote {username}` instead."
                ),
            }
        }
        UserSubcommand::Promote { username } => User::set_admin(&store, &username, true)?,
        UserSubcommand::Demote { username } => User::set_admin(&store, &username, false)?,
    };

    if json {
        return print_json(&user);
    }
    let role = if user.is_admin { "admin" } else { "customer" };
    println!("{} <{}> is now {role}", user.username, user.email);
    Ok(())
}
