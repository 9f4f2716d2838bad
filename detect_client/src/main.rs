use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use detect_client::client::DetectClient;
use env_logger::TimestampPrecision;

#[derive(Parser, Debug)]
#[clap(author, version)]
struct Args {
    /// Address of the detection server to connect to
    #[clap(long, default_value = "127.0.0.1:3000")]
    address: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a local image file
    File { path: PathBuf },

    /// Classify a remote image
    Url { url: String },

    /// Classify a picture taken with a local camera
    #[cfg(feature = "camera")]
    Camera {
        /// Video device to capture from
        #[clap(long, default_value = "/dev/video0")]
        device: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::builder()
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    let client = DetectClient::new(&args.address);

    let resp = match args.command {
        Command::File { path } => client.classify_file(&path).await?,
        Command::Url { url } => client.classify_url(&url).await?,
        #[cfg(feature = "camera")]
        Command::Camera { device } => {
            let frame = detect_client::sensors::capture_frame(&device)
                .map_err(|err| anyhow::anyhow!("camera capture failed: {err}"))?;
            client.classify_camera_frame(frame).await?
        }
    };

    println!("{}", resp.verdict());

    Ok(())
}
