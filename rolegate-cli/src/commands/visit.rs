use anyhow::Result;
use rolegate_core::navigation::Lifetime;
use rolegate_core::portal::{Portal, Visit};
use std::io::Write;

use super::describe;

/// Enter `path` and report what happened once the view settles
pub async fn run(portal: &Portal, path: &str, out: &mut dyn Write) -> Result<()> {
    let view = Lifetime::new();

    match portal.visit(path, view.token()).await {
        Visit::Callback(outcome) => super::callback::report(outcome, out).await?,
        Visit::Guarded(guard) => match guard.settled().await {
            Some(decision) => writeln!(out, "{}: {}", path, describe(&decision))?,
            None => writeln!(out, "{}: view closed before the role was known", path)?,
        },
        Visit::Public => writeln!(out, "{}: public route", path)?,
    }

    Ok(())
}
