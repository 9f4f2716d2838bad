//! Human / not-human image classification with a pre-trained ONNX model.
pub mod endpoints;
pub mod error;
pub mod fetch;
pub mod meter;
pub mod nn;
pub mod pipeline;
pub mod preproc;
pub mod source;

use std::path::Path;
use std::sync::Arc;

use endpoints::ModelHandle;
use nn::HumanModel;

/// Load the model once for the lifetime of the process.
///
/// A failed load is logged and turned into [`ModelHandle::Unavailable`], which disables every
/// prediction until the process is restarted with a working artifact.
pub fn load_model_handle(path: impl AsRef<Path>) -> ModelHandle {
    match HumanModel::load(path) {
        Ok(model) => ModelHandle::Ready(Arc::new(model)),
        Err(err) => {
            log::error!("{err}");
            log::error!("{}", nn::REMEDIATION_MESSAGE);
            ModelHandle::Unavailable
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_missing_model_leaves_handle_unavailable() {
        let handle = load_model_handle("does/not/exist/human_detection_model.onnx");
        assert!(matches!(handle, ModelHandle::Unavailable));
    }

    #[test]
    fn test_corrupt_model_leaves_handle_unavailable() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"definitely not onnx")?;

        assert!(matches!(
            load_model_handle(file.path()),
            ModelHandle::Unavailable
        ));

        Ok(())
    }
}
