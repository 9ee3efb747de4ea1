use lambda_runtime::{run, service_fn, tracing, Error};
use tokio::sync::OnceCell;

mod config;
mod error;
mod event_handler;
mod object_ref;
mod pipeline;
mod storage;
#[cfg(test)]
mod test_support;
mod transformer;

use config::Config;
use event_handler::function_handler;
use storage::S3Store;

/// Reused by every invocation served by this execution environment.
static STORE: OnceCell<S3Store> = OnceCell::const_new();

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::subscriber::fmt().json().init();
    let config = Config::from_env()?;
    tracing::info!(?config, "Configuration loaded");

    let config = &config;
    run(service_fn(move |event| async move {
        let store = STORE.get_or_init(S3Store::from_env).await;
        function_handler(event, store, config).await
    }))
    .await
}
