//! Status command implementation

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::config::ProfiledConfig;
use crate::error::Result;
use crate::scan::PollPolicy;

/// Run the status command to display configuration status
pub fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}\n", "sandop Configuration Status".bold());

    let profiled_config = match ProfiledConfig::load_at(opts.config_ref()) {
        Ok(config) => config,
        Err(_) => {
            println!("{} Configuration not found", "✗".red());
            println!();
            println!(
                "Run {} to create a configuration file.",
                "sandop init".cyan()
            );
            println!();
            return Ok(());
        }
    };

    let config_path = ProfiledConfig::resolve_path(opts.config_ref())?;
    println!("Config file: {}", config_path.display().to_string().cyan());

    let (profile_name, profile) = profiled_config.resolve_profile(opts.profile_ref())?;
    if profile_name == profiled_config.active_profile {
        println!("Profile: {} {}", profile_name.bold(), "(active)".green());
    } else {
        println!(
            "Profile: {} {}",
            profile_name.bold(),
            "(via --profile flag)".dimmed()
        );
    }

    println!();

    if profile.validate_auth().is_ok() {
        println!("{} API key configured", "✓".green());
    } else {
        println!("{} API key not configured", "✗".red());
        println!("  → Run 'sandop init' to configure");
    }

    if profile.api_host.is_some() {
        println!("{} Custom API host: {}", "○".dimmed(), profile.api_host().cyan());
    } else {
        println!("{} API host: {}", "✓".green(), profile.api_host());
    }

    let policy = PollPolicy::from(profile.poll);
    println!(
        "{} Polling every {}ms, up to {} attempts (~{}s)",
        "○".dimmed(),
        policy.interval().as_millis(),
        policy.max_attempts(),
        policy.budget().as_secs()
    );
    println!(
        "{} Request timeout: {}s",
        "○".dimmed(),
        profile.request_timeout().as_secs()
    );

    let other_profiles: Vec<_> = profiled_config
        .list_profiles()
        .into_iter()
        .filter(|p| *p != profile_name)
        .collect();

    if !other_profiles.is_empty() {
        println!();
        println!("Other profiles: {}", other_profiles.join(", ").dimmed());
    }

    println!();

    Ok(())
}
