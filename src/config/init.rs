use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{get_config_path, Config, MailConfig, DEFAULT_BASE_URL};
use crate::scoring::{validate_scoring, AgreementPolicy, PolicyKind, ScoringConfig};
use crate::store::normalize_email;

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Print text with a typewriter effect, one character at a time.
fn typewriter(text: &str) {
    use std::thread;
    use std::time::Duration;
    for c in text.chars() {
        print!("{}", c);
        std::io::stdout().flush().ok();
        thread::sleep(Duration::from_millis(18));
    }
    println!();
}

/// Turn a policy answer ("within 1", "scaled x20") into scoring settings.
fn scoring_from_policy(input: &str) -> Result<ScoringConfig, String> {
    let policy = AgreementPolicy::parse(input).map_err(|e| e.to_string())?;
    let config = match policy {
        AgreementPolicy::Tolerance { tolerance } => ScoringConfig {
            policy: Some(PolicyKind::Tolerance),
            tolerance: Some(tolerance),
            ..ScoringConfig::default()
        },
        AgreementPolicy::Scaled { scale_factor } => ScoringConfig {
            policy: Some(PolicyKind::Scaled),
            tolerance: None,
            scale_factor: Some(scale_factor),
            ..ScoringConfig::default()
        },
    };
    validate_scoring(&config).map_err(|errors| errors.join("; "))?;
    Ok(config)
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    typewriter("CoupleFin Configuration Wizard");
    println!("==============================");
    println!();

    // 1. Who is using this machine
    typewriter("Your email identifies you in sessions you start or join.");
    let user = loop {
        let input = prompt("Your email: ")?;
        match normalize_email(&input) {
            Ok(email) => break email,
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };

    // 2. Where invite links point
    println!();
    typewriter("Invite links send your partner to the quiz. Keep the default unless you host your own.");
    let base_url = loop {
        let input = prompt_with_default("Base URL", DEFAULT_BASE_URL)?;
        match reqwest::Url::parse(&input) {
            Ok(_) => break input,
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };

    // 3. Scoring
    println!();
    typewriter("Two answers agree when they are close on the 1-4 scale.");
    typewriter("  within N     -- answers N or fewer points apart count as a full match");
    typewriter("  scaled xF    -- every point of distance costs F percent (e.g., 'scaled x20')");
    let scoring = loop {
        let input = prompt_with_default("Agreement policy", "within 1")?;
        match scoring_from_policy(&input) {
            Ok(config) => break config,
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };

    // 4. Mail
    println!();
    typewriter("Email invites go through an HTTP relay. Without one they are written to an outbox folder.");
    let mail = if prompt_yes_no("Configure a mail relay?", false)? {
        let relay_url = loop {
            let input = prompt("Relay URL (e.g., https://example.com/api/send-email): ")?;
            match reqwest::Url::parse(&input) {
                Ok(_) => break input,
                Err(e) => println!("  Invalid: {}. Try again.", e),
            }
        };
        let from = prompt_with_default("Sender address", &user)?;
        Some(MailConfig {
            relay_url: Some(relay_url),
            from: Some(from),
            outbox: None,
        })
    } else {
        None
    };

    // 5. Config path
    let default_config_path = default_path.unwrap_or_else(get_config_path);
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 6. Write config
    let config = Config {
        user: Some(user),
        base_url,
        scoring: Some(scoring),
        mail,
        ..Config::default()
    };

    let yaml = serde_saphyr::to_string(&config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(&config_path, &yaml)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Run `couplefin user register {}` and then `couplefin start` to begin.", config.user.as_deref().unwrap_or_default());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_from_tolerance_policy() {
        let config = scoring_from_policy("within 2").unwrap();
        assert_eq!(config.policy(), AgreementPolicy::Tolerance { tolerance: 2 });
    }

    #[test]
    fn test_scoring_from_scaled_policy() {
        let config = scoring_from_policy("scaled x20").unwrap();
        assert_eq!(config.policy(), AgreementPolicy::Scaled { scale_factor: 20.0 });
        assert!(config.tolerance.is_none());
    }

    #[test]
    fn test_scoring_from_policy_rejects_wide_tolerance() {
        // a tolerance covering the whole 1-4 scale makes every pair match
        assert!(scoring_from_policy("within 3").is_err());
        assert!(scoring_from_policy("sometimes").is_err());
    }

    #[test]
    fn test_wizard_config_serializes() {
        let config = Config {
            user: Some("ada@example.com".to_string()),
            scoring: Some(scoring_from_policy("within 1").unwrap()),
            ..Config::default()
        };
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed = crate::config::parse_config(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}
