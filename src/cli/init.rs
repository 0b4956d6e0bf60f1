//! Init command implementation

use colored::Colorize;
use dialoguer::{Input, Password, Select, theme::ColorfulTheme};

use crate::cli::args::GlobalOptions;
use crate::config::{
    DEFAULT_API_HOST, DEFAULT_PROFILE, LOCAL_API_HOST, ProfileConfig, ProfiledConfig,
};
use crate::error::Result;

/// Run the init command
///
/// Stores the API key and host in the selected profile. Nothing is sent to the
/// API; a bad key surfaces on the first scan as a server error.
pub fn run(opts: &GlobalOptions) -> Result<()> {
    let profile_name = opts.profile.as_deref().unwrap_or(DEFAULT_PROFILE);

    println!("{}", "Welcome to sandop!".bold().green());
    if profile_name != DEFAULT_PROFILE {
        println!("Setting up profile: {}\n", profile_name.bold());
    } else {
        println!("Let's set up your sandbox configuration.\n");
    }

    let api_key: String = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Enter your sandbox API key")
        .interact()?;

    let api_host = match &opts.api_host {
        Some(host) => Some(host.clone()),
        None => prompt_host()?,
    };

    let mut profiled_config = ProfiledConfig::load_at(opts.config_ref()).unwrap_or_default();

    // Keep poll settings and timeout from an existing profile
    let mut profile = profiled_config
        .profiles
        .get(profile_name)
        .cloned()
        .unwrap_or_else(ProfileConfig::default);
    profile.api_key = Some(api_key);
    profile.api_host = api_host;
    profiled_config.upsert_profile(profile_name, profile);

    if profiled_config.profiles.len() == 1 || opts.profile.is_some() {
        profiled_config.set_active_profile(profile_name)?;
    }

    profiled_config.save_at(opts.config_ref())?;

    let config_path = ProfiledConfig::resolve_path(opts.config_ref())?;
    println!(
        "\n{} Configuration saved to: {}",
        "✓".green(),
        config_path.display()
    );
    if profile_name != DEFAULT_PROFILE {
        println!("  Profile: {}", profile_name.bold());
    }

    println!("\n{}", "You're all set! Try running:".bold());
    println!("  {} - Show configuration status", "sandop status".cyan());
    println!(
        "  {} - Scan a site and print its report",
        "sandop scan submit example.com".cyan()
    );

    Ok(())
}

/// Ask which sandbox to talk to. `None` means the hosted default.
fn prompt_host() -> Result<Option<String>> {
    let choices = [
        format!("Hosted sandbox ({})", DEFAULT_API_HOST),
        format!("Self-hosted on this machine ({})", LOCAL_API_HOST),
        "Custom URL".to_string(),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Which sandbox do you want to use?")
        .items(&choices)
        .default(0)
        .interact()?;

    let host = match selection {
        0 => None,
        1 => Some(LOCAL_API_HOST.to_string()),
        _ => {
            let url: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("API base URL")
                .validate_with(|input: &String| -> std::result::Result<(), &str> {
                    if input.starts_with("http://") || input.starts_with("https://") {
                        Ok(())
                    } else {
                        Err("URL must start with http:// or https://")
                    }
                })
                .interact_text()?;
            Some(url.trim_end_matches('/').to_string())
        }
    };

    Ok(host)
}
