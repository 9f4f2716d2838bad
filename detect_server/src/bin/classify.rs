//! Classify a single image without running the server.
//!
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use detect_server::{
    fetch::{Fetcher, DEFAULT_FETCH_TIMEOUT},
    nn::{HumanModel, MODEL_FILENAME, REMEDIATION_MESSAGE},
    pipeline::classify,
    source::ImageSource,
};
use env_logger::TimestampPrecision;

#[derive(Parser, Debug)]
#[clap(author, version)]
struct Args {
    /// Image file to classify (JPG, JPEG, PNG, BMP or WEBP)
    #[clap(required_unless_present = "url", conflicts_with = "url")]
    image: Option<PathBuf>,

    /// Address of a remote image to classify instead of a file
    #[clap(long)]
    url: Option<String>,

    /// Path of the ONNX model artifact
    #[clap(long, default_value = MODEL_FILENAME)]
    model: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::builder()
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    let model = match HumanModel::load(&args.model) {
        Ok(model) => model,
        Err(err) => {
            log::error!("{err}");
            bail!(REMEDIATION_MESSAGE);
        }
    };

    let source = match (args.image, args.url) {
        (Some(path), _) => {
            let bytes = std::fs::read(&path)?;
            ImageSource::Upload {
                bytes: bytes.into(),
                filename: path.file_name().map(|name| name.to_string_lossy().into_owned()),
            }
        }
        (None, Some(url)) => ImageSource::Url(url),
        (None, None) => bail!("either an image file or --url is required"),
    };

    let fetcher = Fetcher::new(DEFAULT_FETCH_TIMEOUT)?;
    let image = source
        .load(&fetcher)
        .await
        .map_err(|err| {
            log::warn!("{err}");
            anyhow!(err.user_message())
        })?;
    let verdict = classify(&model, &image)?;

    println!("{verdict}");

    Ok(())
}
