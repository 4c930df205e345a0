//! Profile commands.

use clap::Subcommand;
use console::style;
use photomap::photo::{Profile, ProfileUpdate};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Profile subcommands.
#[derive(Debug, Subcommand)]
pub enum ProfileCommands {
    /// Show a profile
    Get {
        /// User id (defaults to backend.user_id)
        user_id: Option<String>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Create or update the signed-in user's profile
    Set {
        #[arg(long)]
        username: String,

        /// Display name; omit to clear
        #[arg(long)]
        full_name: Option<String>,

        /// Short bio; omit to clear
        #[arg(long)]
        bio: Option<String>,

        /// Avatar image URL; omit to keep the current one
        #[arg(long)]
        avatar_url: Option<String>,
    },
}

/// Run a profile subcommand.
pub fn run(runner: &CliRunner, command: ProfileCommands) -> Result<(), CliError> {
    runner.log_startup("profile");
    let app = runner.start_app()?;
    let repository = app.repository();

    match command {
        ProfileCommands::Get { user_id, json } => {
            let user_id = user_id
                .or_else(|| app.config().backend.user_id.clone())
                .ok_or_else(|| {
                    CliError::InvalidArgument(
                        "no user id given and backend.user_id is not set".to_string(),
                    )
                })?;

            match runner.block_on(repository.get_profile(&user_id))? {
                Some(profile) if json => {
                    let text = serde_json::to_string_pretty(&profile).map_err(|e| {
                        CliError::InvalidArgument(format!("Failed to encode JSON: {}", e))
                    })?;
                    println!("{}", text);
                }
                Some(profile) => println!("{}", format_profile(&profile)),
                None => println!("No profile for {}.", user_id),
            }
            Ok(())
        }
        ProfileCommands::Set {
            username,
            full_name,
            bio,
            avatar_url,
        } => {
            let update = ProfileUpdate {
                username,
                full_name,
                bio,
                avatar_url,
            };
            let profile = runner.block_on(repository.update_profile(update))?;
            println!("{}", style("Profile saved").green().bold());
            println!("{}", format_profile(&profile));
            Ok(())
        }
    }
}

/// Multi-line listing of a profile. Unset fields are shown as `-`.
pub fn format_profile(profile: &Profile) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    [
        ("id", profile.id.clone()),
        ("username", field(&profile.username)),
        ("full name", field(&profile.full_name)),
        ("bio", field(&profile.bio)),
        ("avatar", field(&profile.avatar_url)),
        ("updated", profile.updated_at.format("%Y-%m-%d %H:%M").to_string()),
    ]
    .iter()
    .map(|(label, value)| format!("{:<10} {}", label, value))
    .collect::<Vec<_>>()
    .join("\n")
}
