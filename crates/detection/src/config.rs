//! Detector configuration

use serde::{Deserialize, Serialize};

/// Detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Path to a YOLOv8 ONNX model; mock detections are used when absent
    pub model_path: Option<String>,

    /// Minimum confidence for a detection to be kept
    pub confidence_threshold: f32,

    /// IoU threshold for non-maximum suppression
    pub iou_threshold: f32,

    /// Square model input size (pixels)
    pub input_size: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            input_size: 640,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert!(config.model_path.is_none());
        assert!((config.confidence_threshold - 0.25).abs() < f32::EPSILON);
        assert_eq!(config.input_size, 640);
    }
}
