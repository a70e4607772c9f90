//! Object detection collaborator
//!
//! The request pipeline treats detection as an injected dependency behind
//! the [`Detector`] trait. The shipped implementation runs a YOLOv8 ONNX
//! model through ONNX Runtime; when no model file is configured it falls
//! back to a fixed mock detection set so the rest of the pipeline stays
//! exercisable.

pub mod config;
pub mod labels;
pub mod yolo;

pub use config::DetectorConfig;
pub use labels::{class_name, COCO_CLASSES, EMERGENCY_CLASSES};
pub use yolo::{BoundingBox, Detection, Detector, YoloDetector};

use thiserror::Error;

/// Detection error types
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),
}
