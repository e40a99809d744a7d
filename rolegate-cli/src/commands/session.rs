use anyhow::Result;
use rolegate_core::portal::Portal;
use std::io::Write;

/// Print the persisted session; the token is never shown in full
pub async fn show(portal: &Portal, out: &mut dyn Write) -> Result<()> {
    let Some(session) = portal.session().await? else {
        writeln!(out, "not signed in")?;
        return Ok(());
    };

    let user = session.user();
    writeln!(out, "user:   {} <{}> (id {})", user.name, user.email, user.id)?;
    if let Some(nrp) = &user.nrp {
        writeln!(out, "nrp:    {}", nrp)?;
    }
    writeln!(out, "role:   {} (as sent by the provider)", user.role)?;
    writeln!(out, "token:  {}", mask(session.token()))?;
    writeln!(
        out,
        "issued: {} ({} min ago)",
        session.issued_at().to_rfc3339(),
        session.age().num_minutes()
    )?;

    Ok(())
}

pub async fn logout(portal: &Portal, out: &mut dyn Write) -> Result<()> {
    let had_session = portal.session().await?.is_some();
    portal.logout().await?;

    if had_session {
        writeln!(out, "signed out")?;
    } else {
        writeln!(out, "not signed in")?;
    }
    Ok(())
}

fn mask(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if visible.len() == token.len() {
        "*".repeat(token.chars().count())
    } else {
        format!("{}...", visible)
    }
}
