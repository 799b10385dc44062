// This is the Lambda bootstrap entry point for the poster function

use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;
use tracing::error;
use xposter::core::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Error> {
    xposter::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e.to_string())
    })?;
    let config = &config;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        xposter::worker::handler(config, event).await
    }))
    .await
}
