//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Password, Select};

use neotalk_config::{self as config, Config, Profile};
use neotalk_core::StorageKind;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

const STORAGE_CHOICES: [(StorageKind, &str); 3] = [
    (StorageKind::Hybrid, "Hybrid: backend first, local copy as fallback (recommended)"),
    (StorageKind::Api, "API: backend only"),
    (StorageKind::Local, "Local: this machine only"),
];

/// Plaintext tokens are replaced before display.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some("********".into());
        }
    }
    cfg
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("NeoTalk CLI configuration");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load_config_or_default();

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. Server URL
            let server: String = Input::new()
                .with_prompt("Server URL")
                .default("http://127.0.0.1:9375".into())
                .validate_with(|s: &String| config::parse_server_url(s).map(|_| ()))
                .interact_text()
                .map_err(prompt_err)?;

            // 3. Token, kept out of the file when an env var is named
            let token_env: String = Input::new()
                .with_prompt("Environment variable holding the token (blank to skip)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;
            let token = if token_env.is_empty() {
                let secret = Password::new()
                    .with_prompt("Token (blank for none)")
                    .allow_empty_password(true)
                    .interact()
                    .map_err(prompt_err)?;
                (!secret.is_empty()).then_some(secret)
            } else {
                None
            };

            // 4. Storage mode
            let labels: Vec<&str> = STORAGE_CHOICES.iter().map(|(_, l)| *l).collect();
            let selection = Select::new()
                .with_prompt("Dashboard storage")
                .items(&labels)
                .default(0)
                .interact()
                .map_err(prompt_err)?;
            let mode = STORAGE_CHOICES
                .get(selection)
                .map_or(StorageKind::Hybrid, |(kind, _)| *kind);

            // 5. Build profile and config
            let profile = Profile {
                server,
                token,
                token_env: (!token_env.is_empty()).then_some(token_env),
                mode: Some(mode),
                ..Profile::default()
            };

            if cfg.profiles.contains_key(&profile_name)
                && !Confirm::new()
                    .with_prompt(format!("Replace existing profile '{profile_name}'?"))
                    .default(false)
                    .interact()
                    .map_err(prompt_err)?
            {
                return Ok(());
            }
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());

            // 6. Write config
            let path = config::save_config(&cfg)?;

            eprintln!("\nConfiguration written to {}", path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: neotalk dashboards list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config()?);
            let out = output::render_single(
                global.output,
                &cfg,
                |c| {
                    toml::to_string_pretty(c)
                        .unwrap_or_else(|e| format!("<serialization failed: {e}>"))
                },
                |c| c.profiles.keys().cloned().collect::<Vec<_>>().join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn show_never_prints_plaintext_tokens() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                server: "http://lab:9375".into(),
                token: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        let shown = redacted(&cfg);
        assert_eq!(shown.profiles["lab"].token.as_deref(), Some("********"));
        assert_eq!(cfg.profiles["lab"].token.as_deref(), Some("hunter2"));
    }
}
