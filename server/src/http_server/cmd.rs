use appkit::server::run_server;
use tracing::info;

use crate::{http_server::routes, AppState, Result};

pub(crate) async fn serve() -> Result<()> {
    let app_state = AppState::from_env().await?;

    info!(version = app_state.versions.package_version, "Starting server");

    run_server(routes::make_router().with_state(app_state)).await?;

    info!("Main Returning");

    Ok(())
}
