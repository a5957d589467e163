//! Tab commands: fetch one view through the engine and print its data.

use tracing::{debug, warn};

use itch_core::{Engine, FetchReason, TabId};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Fetch `tab` as if the user had just opened it, then print the view data
/// the engine pushed for it.
pub async fn show(engine: &Engine, tab: TabId, global: &GlobalOpts) -> Result<(), CliError> {
    debug!(tab = %tab, "fetching tab");
    engine.fetch_now(tab.clone(), FetchReason::TabChanged).await?;
    engine.settled().await;

    let state = engine.store().state();
    for message in &state.status_messages {
        warn!(status = %message, "engine reported a problem");
    }

    let data = state
        .tab(&tab)
        .map(|t| t.data.clone())
        .ok_or_else(|| CliError::NotFound {
            message: format!("no data for {tab}"),
        })?;
    let out = output::render_tab(&global.output, &data)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Print the logged-in user.
pub fn whoami(engine: &Engine, global: &GlobalOpts) -> Result<(), CliError> {
    let state = engine.store().state();
    let me = state.me.as_ref().ok_or_else(|| CliError::AuthFailed {
        profile: global.profile.clone().unwrap_or_else(|| "default".into()),
        reason: "not logged in".into(),
    })?;

    let out = match global.output {
        OutputFormat::Json => output::render_json(me, false)?,
        OutputFormat::JsonCompact => output::render_json(me, true)?,
        OutputFormat::Plain => format!("{}\t{}", me.id, me.username),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
