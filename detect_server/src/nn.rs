use std::path::Path;

use tract_onnx::prelude::*;

use crate::error::{InferenceError, LoadError};
use crate::preproc::{INPUT_CHANNELS, INPUT_SIZE};

type NnModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// File name of the model artifact, relative to the working directory.
pub const MODEL_FILENAME: &str = "human_detection_model.onnx";

/// Shown to users whenever prediction is disabled because the model could not be loaded.
pub const REMEDIATION_MESSAGE: &str = "The human detection model is not available. \
     Place the exported `human_detection_model.onnx` in the working directory of the server \
     and restart it.";

/// Anything that turns a preprocessed input tensor into a single prediction score.
pub trait InferModel: Send + Sync {
    fn infer(&self, input: Tensor) -> Result<f32, InferenceError>;
}

/// Binary human detector backed by an ONNX graph.
///
/// Input is a `(1, 64, 64, 3)` f32 tensor, output the sigmoid score of the `NOT_HUMAN` class.
pub struct HumanModel {
    model: NnModel,
}

impl HumanModel {
    /// Load the model from `path`.
    ///
    /// Either the whole graph loads and is made runnable for the fixed input shape, or an error
    /// is returned. There is no partial load and no retry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(LoadError::Missing {
                path: path.to_path_buf(),
            });
        }

        let model = get_human_model(path).map_err(|source| LoadError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded model {}", path.display());

        Ok(Self { model })
    }
}

impl InferModel for HumanModel {
    fn infer(&self, input: Tensor) -> Result<f32, InferenceError> {
        let raw_nn_out = self
            .model
            .run(tvec!(input.into()))
            .map_err(InferenceError::Backend)?;
        let output = raw_nn_out.first().ok_or(InferenceError::EmptyOutput)?;

        extract_prediction(output)
    }
}

fn get_human_model(path: &Path) -> TractResult<NnModel> {
    let input_fact = InferenceFact::dt_shape(
        f32::datum_type(),
        tvec!(1, INPUT_SIZE as usize, INPUT_SIZE as usize, INPUT_CHANNELS),
    );
    let model = tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(0, input_fact)?
        .into_optimized()?
        .into_runnable()?;

    Ok(model)
}

/// Get the single score out of the `(1, 1)` output of the network.
fn extract_prediction(output: &Tensor) -> Result<f32, InferenceError> {
    let view = output
        .to_array_view::<f32>()
        .map_err(InferenceError::Backend)?;

    view.iter().next().copied().ok_or(InferenceError::EmptyOutput)
}
