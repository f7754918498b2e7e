pub use tracing_common::{setup_sentry, setup_tracing, ClientInitGuard};
