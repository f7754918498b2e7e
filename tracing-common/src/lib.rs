use std::{collections::HashMap, time::Duration};

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use opentelemetry_otlp::WithExportConfig;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

pub use sentry::ClientInitGuard;

fn default_filter(service_name: &str) -> String {
    format!("warn,{service_name}=trace,db=debug,appkit=debug,tower_http=debug")
}

/// Installs Sentry when `SENTRY_DSN` is present.
///
/// The returned guard flushes pending events on drop, so keep it alive for the
/// whole process.
pub fn setup_sentry() -> Option<ClientInitGuard> {
    let Ok(dsn) = std::env::var("SENTRY_DSN") else {
        println!("SENTRY_DSN not set, skipping Sentry");

        return None;
    };

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            traces_sample_rate: 0.2,
            ..Default::default()
        },
    ));

    Some(guard)
}

pub fn setup_tracing(service_name: &str) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter(service_name));

    let env_filter = EnvFilter::builder()
        .parse(&rust_log)
        .wrap_err_with(|| eyre!("Couldn't create env filter from {}", rust_log))?;

    let opentelemetry_layer = if let Ok(honeycomb_key) = std::env::var("HONEYCOMB_API_KEY") {
        let mut map = HashMap::<String, String>::new();
        map.insert("x-honeycomb-team".to_string(), honeycomb_key);
        map.insert("x-honeycomb-dataset".to_string(), service_name.to_string());

        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .http()
                    .with_endpoint("https://api.honeycomb.io/v1/traces")
                    .with_timeout(Duration::from_secs(3))
                    .with_headers(map),
            )
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .wrap_err("Failed to install the OTLP trace pipeline")?;

        println!("Honeycomb layer configured");

        Some(OpenTelemetryLayer::new(tracer))
    } else {
        println!("Skipping Honeycomb layer");

        None
    };

    let heirarchical = HierarchicalLayer::default()
        .with_writer(std::io::stdout)
        .with_indent_lines(true)
        .with_indent_amount(2)
        .with_thread_names(true)
        .with_thread_ids(true)
        .with_verbose_exit(true)
        .with_verbose_entry(true)
        .with_targets(true);

    Registry::default()
        .with(heirarchical)
        .with(opentelemetry_layer)
        .with(sentry_tracing::layer())
        .with(env_filter)
        .try_init()
        .wrap_err("Failed to install the tracing subscriber")?;

    Ok(())
}
