use anyhow::Result;
use rolegate_core::rbac::RouteMap;
use std::io::Write;

pub fn run(routes: &RouteMap, out: &mut dyn Write) -> Result<()> {
    for (role, prefix) in routes.entries() {
        writeln!(out, "{:<18} {}", role.as_str(), prefix)?;
    }
    Ok(())
}
