use std::future::IntoFuture;

use log::info;
use tokio::{net::TcpListener, signal};

use coordinator::{CoordinatorBuilder, config, http};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let spec = config::load_spec()?;
    let coordinator = CoordinatorBuilder::new().build(spec);

    let addr = config::listen_addr();
    let list = TcpListener::bind(&addr).await?;
    info!("listening at {addr}");

    tokio::select! {
        served = axum::serve(list, http::router(coordinator)).into_future() => served?,
        _ = signal::ctrl_c() => info!("shutting down"),
    }

    Ok(())
}
