//! Config subcommand handlers.

use serde::Serialize;
use tabled::Tabled;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

/// A profile as shown to the user. Plaintext tokens never leave the file.
#[derive(Serialize)]
struct ProfileView {
    name: String,
    server: String,
    default: bool,
    session_token: Option<&'static str>,
    session_token_env: Option<String>,
    timeout: Option<u64>,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Server")]
    server: String,
    #[tabled(rename = "Token")]
    token: String,
}

fn profile_views(cfg: &Config) -> Vec<ProfileView> {
    let mut views: Vec<ProfileView> = cfg
        .profiles
        .iter()
        .map(|(name, p)| ProfileView {
            name: name.clone(),
            server: p.server.clone(),
            default: cfg.default_profile.as_deref() == Some(name.as_str()),
            session_token: p.session_token.as_ref().map(|_| "****"),
            session_token_env: p.session_token_env.clone(),
            timeout: p.timeout,
        })
        .collect();
    views.sort_by(|a, b| a.name.cmp(&b.name));
    views
}

fn save(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    tracing::info!(path = %config::config_path().display(), "config saved");
    Ok(())
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    // A broken file must surface here rather than be overwritten
    let mut cfg = config::load_config()?;

    match args.command {
        ConfigCommand::Profiles => {
            let views = profile_views(&cfg);
            let out = output::render_list(
                global.output,
                views.as_slice(),
                |v: &ProfileView| ProfileRow {
                    marker: if v.default { "*" } else { "" },
                    name: v.name.clone(),
                    server: v.server.clone(),
                    token: match (&v.session_token_env, v.session_token) {
                        (Some(env), _) => format!("${env}"),
                        (None, Some(masked)) => masked.to_string(),
                        (None, None) => "-".into(),
                    },
                },
                |v| v.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetProfile {
            name,
            url,
            token_env,
            default,
        } => {
            config::parse_server_url(&url)?;
            let previous = cfg.profiles.get(&name);
            let profile = Profile {
                server: url,
                session_token: previous.and_then(|p| p.session_token.clone()),
                session_token_env: token_env
                    .or_else(|| previous.and_then(|p| p.session_token_env.clone())),
                timeout: previous.and_then(|p| p.timeout),
            };
            cfg.profiles.insert(name.clone(), profile);

            // The first usable profile becomes the default
            if default || cfg.profile(None).is_err() {
                cfg.default_profile = Some(name.clone());
            }
            save(&cfg)?;
            print_profile(&cfg, &name, global)
        }

        ConfigCommand::Use { name } => {
            if let Err(config::ConfigError::ProfileNotFound { name }) = cfg.profile(Some(&name)) {
                return Err(config::profile_not_found(name, &cfg));
            }
            cfg.default_profile = Some(name.clone());
            save(&cfg)?;
            print_profile(&cfg, &name, global)
        }
    }
}

fn print_profile(cfg: &Config, name: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let Some(view) = profile_views(cfg).into_iter().find(|v| v.name == name) else {
        return Err(CliError::Internal(format!("profile '{name}' vanished after save")));
    };
    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &view,
        |v| {
            output::detail_lines(
                &[
                    ("Profile", v.name.clone()),
                    ("Server", v.server.clone()),
                    ("Default", if v.default { "yes" } else { "no" }.to_string()),
                    ("Config", config::config_path().display().to_string()),
                ],
                color,
            )
        },
        |v| v.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn views_redact_tokens_and_sort() {
        let mut profiles = HashMap::new();
        profiles.insert(
            "work".to_string(),
            Profile {
                server: "https://stats.example.com".into(),
                session_token: Some("secret".into()),
                session_token_env: None,
                timeout: None,
            },
        );
        profiles.insert(
            "home".to_string(),
            Profile {
                server: "http://localhost:8000".into(),
                session_token: None,
                session_token_env: Some("HOME_TOKEN".into()),
                timeout: Some(5),
            },
        );
        let cfg = Config {
            default_profile: Some("home".into()),
            profiles,
            ..Config::default()
        };

        let views = profile_views(&cfg);
        assert_eq!(views[0].name, "home");
        assert!(views[0].default);
        assert_eq!(views[1].session_token, Some("****"));

        let json = serde_json::to_string(&views).unwrap();
        assert!(!json.contains("secret"));
    }
}
