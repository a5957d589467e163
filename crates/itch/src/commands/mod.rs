//! Command dispatch: bridges CLI args -> engine actions -> output formatting.

pub mod config_cmd;
pub mod tabs;

use secrecy::SecretString;
use tracing::debug;

use itch_config::{Config, Overrides};
use itch_core::action::{AttemptLogin, Preboot};
use itch_core::{Engine, TabId};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let engine = connect(global).await?;
    let result = match cmd {
        Command::Whoami => tabs::whoami(&engine, global),
        Command::Collections => tabs::show(&engine, TabId::new("collections"), global).await,
        Command::Collection(args) => {
            tabs::show(&engine, TabId::new(format!("collections/{}", args.id)), global).await
        }
        Command::Game(args) => {
            tabs::show(&engine, TabId::new(format!("games/{}", args.id)), global).await
        }
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    };
    engine.shutdown().await;
    result
}

/// Start an engine, run preboot, and log in with the resolved key.
async fn connect(global: &GlobalOpts) -> Result<Engine, CliError> {
    let cfg = itch_config::load_config_or_default();
    let profile_name = cfg.active_profile_name(global.profile.as_deref());
    let profile = lookup_profile(&cfg, &profile_name, global.profile.is_some())?;

    let key = itch_config::resolve_api_key(profile, &profile_name, global.api_key.as_deref())?;
    let core_config = itch_config::to_core_config(
        &cfg,
        profile,
        &Overrides {
            api_url: global.api_url.clone(),
            timeout: global.timeout,
        },
    )?;

    let engine = Engine::start(core_config)?;
    engine.dispatch(Preboot);
    engine.settled().await;

    login(&engine, key, &profile_name).await?;
    Ok(engine)
}

/// A profile named on the command line must exist; the implicit default
/// may be absent.
fn lookup_profile<'a>(
    cfg: &'a Config,
    name: &str,
    explicit: bool,
) -> Result<Option<&'a itch_config::Profile>, CliError> {
    match cfg.profile(name) {
        Some(profile) => Ok(Some(profile)),
        None if explicit => Err(CliError::ProfileNotFound {
            name: name.into(),
            available: cfg.available_profiles(),
        }),
        None => Ok(None),
    }
}

async fn login(engine: &Engine, api_key: SecretString, profile: &str) -> Result<(), CliError> {
    engine.dispatch(AttemptLogin { api_key });
    engine.settled().await;

    if engine.session().is_logged_in() {
        debug!(profile, "logged in");
        return Ok(());
    }
    let state = engine.store().state();
    Err(CliError::AuthFailed {
        profile: profile.into(),
        reason: if state.login_errors.is_empty() {
            "unknown error".into()
        } else {
            state.login_errors.join("; ")
        },
    })
}
