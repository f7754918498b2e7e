use color_eyre::eyre::WrapErr;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub mod auth;

pub mod trace;

/// Wraps the routes in the request tracing layer.
pub fn with_tracing(routes: axum::Router) -> axum::Router {
    let tracer = trace::Tracer;
    let trace_layer = tower_http::trace::TraceLayer::new_for_http()
        .make_span_with(tracer)
        .on_response(tracer);

    routes.layer(trace_layer)
}

pub fn port_from_env() -> color_eyre::Result<u16> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());

    port.parse()
        .wrap_err_with(|| format!("PORT must be a valid port number, got {port}"))
}

pub async fn run_server(routes: axum::Router) -> color_eyre::Result<()> {
    let app = with_tracing(routes);

    let port = port_from_env()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("Starting server on port {}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err("Failed to open port")?;

    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Failed to run server")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");

        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received");
}
