use anyhow::{bail, Result};
use rolegate_core::callback::CallbackOutcome;
use rolegate_core::navigation::Lifetime;
use rolegate_core::portal::{Portal, RouteKind, Visit};
use std::io::Write;

/// Ingest `url` and stay on the callback view until its redirect fires
pub async fn run(portal: &Portal, url: &str, out: &mut dyn Write) -> Result<()> {
    if portal.route_kind(url) != RouteKind::Callback {
        bail!("{} is not the callback route", url);
    }

    let view = Lifetime::new();
    match portal.visit(url, view.token()).await {
        Visit::Callback(outcome) => report(outcome, out).await,
        other => bail!("expected the callback view, got a {} route", other.kind_name()),
    }
}

pub(crate) async fn report(outcome: CallbackOutcome, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", outcome.state.message())?;
    if outcome.replayed {
        writeln!(out, "(callback already handled; session untouched)")?;
    }

    if let Some(redirect) = &outcome.redirect {
        writeln!(out, "redirecting to {} in {} ms", redirect.to, redirect.delay.as_millis())?;
    }
    if let Some(navigation) = outcome.navigation {
        navigation.await?;
    }

    Ok(())
}
