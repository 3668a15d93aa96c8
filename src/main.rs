#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use hookd::{init_env, record, utils::logger, AppContext, Config, HOST, PORT};

#[tokio::main]
async fn main() -> Result<()> {
    init_env();

    let _guard = logger::init("./logs".to_string())?;

    info!("Starting webhook receiver...");

    let config = Config::from_env();
    record::announce_startup(&config);

    let ctx = Arc::new(AppContext { config });

    let addr: SocketAddr = format!("{}:{}", *HOST, *PORT).parse()?;
    info!("Starting HTTP server at http://{}", addr);

    match hookd::web::start_server(ctx, addr).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            tracing::error!("Server error: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
