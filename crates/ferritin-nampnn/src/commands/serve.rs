use ferritin_nampnn::{web, ToolConfig};
use std::net::SocketAddr;

pub async fn execute(config: ToolConfig, addr: SocketAddr) -> anyhow::Result<()> {
    web::serve(config, addr).await
}
