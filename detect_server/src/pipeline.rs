//! Decision pipeline: preprocess, infer, threshold.
//!
use common::protocol::{Label, Verdict};
use image::DynamicImage;

use crate::{error::InferenceError, nn::InferModel, preproc::preprocess};

/// Predictions strictly above this value are classified as `NOT_HUMAN`.
pub const THRESHOLD: f32 = 0.5;

/// Classify a decoded image with the given model.
pub fn classify<M>(model: &M, image: &DynamicImage) -> Result<Verdict, InferenceError>
where
    M: InferModel + ?Sized,
{
    let input = preprocess(image);
    let prediction = model.infer(input)?;
    log::debug!("Raw prediction {prediction}");

    decide(prediction)
}

/// Apply the decision threshold to a raw prediction in `[0, 1]`.
///
/// Confidence is the distance from the boundary, so it lies in `[50, 100]` for every valid
/// prediction.
pub fn decide(prediction: f32) -> Result<Verdict, InferenceError> {
    if !(0.0..=1.0).contains(&prediction) {
        return Err(InferenceError::InvalidPrediction(prediction));
    }

    let verdict = match prediction {
        x if x > THRESHOLD => Verdict {
            label: Label::NotHuman,
            confidence_percent: x * 100.0,
        },
        x => Verdict {
            label: Label::Human,
            confidence_percent: (1.0 - x) * 100.0,
        },
    };

    Ok(verdict)
}

#[cfg(test)]
mod test {
    use image::{Rgb, RgbImage};
    use tract_onnx::prelude::Tensor;

    use super::*;

    /// Model returning a fixed score.
    struct FixedModel(f32);

    impl InferModel for FixedModel {
        fn infer(&self, input: Tensor) -> Result<f32, InferenceError> {
            assert_eq!(input.shape(), &[1, 64, 64, 3]);
            Ok(self.0)
        }
    }

    /// Model returning the mean intensity of its input.
    struct MeanModel;

    impl InferModel for MeanModel {
        fn infer(&self, input: Tensor) -> Result<f32, InferenceError> {
            let view = input
                .to_array_view::<f32>()
                .map_err(InferenceError::Backend)?;
            Ok(view.mean().unwrap_or(0.0))
        }
    }

    struct BrokenModel;

    impl InferModel for BrokenModel {
        fn infer(&self, _input: Tensor) -> Result<f32, InferenceError> {
            Err(InferenceError::Backend(anyhow::anyhow!("shape mismatch")))
        }
    }

    fn test_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(97, 31, |x, y| {
            Rgb([(x * 2 % 256) as u8, (y * 5 % 256) as u8, 200])
        }))
    }

    fn assert_verdict(verdict: Verdict, label: Label, confidence_percent: f32) {
        assert_eq!(verdict.label, label);
        assert!(
            (verdict.confidence_percent - confidence_percent).abs() < 1e-3,
            "{} != {}",
            verdict.confidence_percent,
            confidence_percent
        );
    }

    #[test]
    fn test_scenarios() -> Result<(), InferenceError> {
        let image = test_image();

        assert_verdict(
            classify(&FixedModel(0.9), &image)?,
            Label::NotHuman,
            90.0,
        );
        assert_verdict(classify(&FixedModel(0.1), &image)?, Label::Human, 90.0);
        assert_verdict(classify(&FixedModel(0.5), &image)?, Label::Human, 50.0);

        Ok(())
    }

    #[test]
    fn test_threshold_is_strict() -> Result<(), InferenceError> {
        let verdict = decide(THRESHOLD)?;
        assert_eq!(verdict.label, Label::Human);
        assert_eq!(verdict.confidence_percent, 50.0);

        let verdict = decide(0.500_001)?;
        assert_eq!(verdict.label, Label::NotHuman);

        Ok(())
    }

    #[test]
    fn test_confidence_range_and_monotonicity() -> Result<(), InferenceError> {
        let mut last: Option<(f32, f32)> = None;
        for i in 0..=1000 {
            let prediction = i as f32 / 1000.0;
            let verdict = decide(prediction)?;
            assert!((50.0..=100.0).contains(&verdict.confidence_percent));

            // Confidence only depends on the distance from the boundary
            let distance = (prediction - THRESHOLD).abs();
            let mirrored = decide((THRESHOLD - (prediction - THRESHOLD)).clamp(0.0, 1.0))?;
            assert!((verdict.confidence_percent - mirrored.confidence_percent).abs() < 1e-3);

            if prediction >= THRESHOLD {
                if let Some((last_distance, last_confidence)) = last {
                    assert!(distance >= last_distance);
                    assert!(verdict.confidence_percent >= last_confidence);
                }
                last = Some((distance, verdict.confidence_percent));
            }
        }

        Ok(())
    }

    #[test]
    fn test_extremes() -> Result<(), InferenceError> {
        assert_verdict(decide(0.0)?, Label::Human, 100.0);
        assert_verdict(decide(1.0)?, Label::NotHuman, 100.0);

        Ok(())
    }

    #[test]
    fn test_invalid_predictions_are_rejected() {
        for prediction in [f32::NAN, f32::INFINITY, -0.01, 1.01] {
            assert!(matches!(
                decide(prediction),
                Err(InferenceError::InvalidPrediction(_))
            ));
        }
    }

    #[test]
    fn test_classify_is_deterministic() -> Result<(), InferenceError> {
        let image = test_image();
        let first = classify(&MeanModel, &image)?;
        let second = classify(&MeanModel, &image)?;

        assert_eq!(first.label, second.label);
        assert_eq!(
            first.confidence_percent.to_bits(),
            second.confidence_percent.to_bits()
        );

        Ok(())
    }

    #[test]
    fn test_backend_error_propagates() {
        let result = classify(&BrokenModel, &test_image());
        assert!(matches!(result, Err(InferenceError::Backend(_))));
    }

    #[test]
    fn test_classify_through_trait_object() -> Result<(), InferenceError> {
        let model: Box<dyn InferModel> = Box::new(FixedModel(0.75));
        assert_verdict(classify(model.as_ref(), &test_image())?, Label::NotHuman, 75.0);

        Ok(())
    }
}
