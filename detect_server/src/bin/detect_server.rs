//! Detection server binary.
//!
use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use detect_server::{
    endpoints::{router, AppState},
    fetch::Fetcher,
    load_model_handle,
    meter::spawn_meter_logger,
    nn::MODEL_FILENAME,
};
use env_logger::TimestampPrecision;

#[derive(Parser, Debug)]
#[clap(author, version)]
struct Args {
    /// Address to serve the HTTP endpoints on
    #[clap(long, default_value = "127.0.0.1:3000")]
    server_address: String,

    /// Path of the ONNX model artifact
    #[clap(long, default_value = MODEL_FILENAME)]
    model: PathBuf,

    /// Timeout for downloading remote images, in seconds
    #[clap(long, default_value_t = 15)]
    fetch_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logger
    env_logger::builder()
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    // Load once, the handle is shared read-only by all requests
    let model = load_model_handle(&args.model);
    let fetcher = Fetcher::new(Duration::from_secs(args.fetch_timeout_secs))?;

    spawn_meter_logger(Duration::from_secs(10));

    let app = router(AppState::new(model, fetcher));

    // Serve HTTP server
    let addr: SocketAddr = args.server_address.parse()?;
    log::info!("Serving on http://{}", &addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
