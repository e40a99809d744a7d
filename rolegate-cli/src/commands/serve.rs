use anyhow::Result;
use rolegate_core::http::RoleLookupServer;
use std::path::Path;

/// Serve the role table at `table` until interrupted
pub async fn run(bind: &str, table: &Path) -> Result<()> {
    let table = RoleLookupServer::table_from_file(table)?;
    let server = RoleLookupServer::bind(bind, table).await?;

    println!("Role lookup endpoint: {}", server.endpoint());
    server.serve().await
}
