use anyhow::{Context, Result};
use ndarray::Array4;
use opencv::core::Mat;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

use super::keypoint::{JointName, JointSample, Pose};
use super::preprocess::{letterbox_for_movenet, Letterbox};
use super::source::LandmarkSource;

/// MoveNet single-pose detector on ONNX Runtime
pub struct MoveNetDetector {
    session: Session,
    min_pose_confidence: f32,
}

impl MoveNetDetector {
    /// Load the ONNX model. Poses whose arm joints average below
    /// `min_pose_confidence` are reported as absent.
    pub fn new<P: AsRef<Path>>(model_path: P, min_pose_confidence: f32) -> Result<Self> {
        let path = model_path.as_ref();
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load ONNX model {}", path.display()))?;

        Ok(Self {
            session,
            min_pose_confidence,
        })
    }

    /// Run the model on a letterboxed tensor. Joints come back normalized
    /// to the original frame.
    pub fn infer(&mut self, input: Array4<f32>, letterbox: &Letterbox) -> Result<Pose> {
        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs!["serving_default_input_0" => input_tensor])
            .context("Inference failed")?;

        // [1, 1, 17, 3] as (y, x, confidence)
        let output: ndarray::ArrayViewD<f32> = outputs["StatefulPartitionedCall_0"]
            .try_extract_array()
            .context("Failed to extract output tensor")?;

        let mut pose = Pose::default();
        for (i, joint) in (0..JointName::COUNT).filter_map(|i| Some((i, JointName::from_index(i)?))) {
            let (x, y) = letterbox.to_frame(output[[0, 0, i, 1]], output[[0, 0, i, 0]]);
            pose.set(joint, JointSample::new(x, y, output[[0, 0, i, 2]]));
        }

        Ok(pose)
    }
}

impl LandmarkSource<Mat> for MoveNetDetector {
    fn detect(&mut self, frame: &Mat) -> Option<Pose> {
        let pose = match letterbox_for_movenet(frame).and_then(|(input, lb)| self.infer(input, &lb)) {
            Ok(pose) => pose,
            Err(e) => {
                log::warn!("pose detection failed: {e:#}");
                return None;
            }
        };

        if pose.arm_confidence() < self.min_pose_confidence {
            log::trace!("no body: arm confidence {:.2}", pose.arm_confidence());
            return None;
        }
        Some(pose)
    }
}
