//! YOLOv8 detector over ONNX Runtime

use image::DynamicImage;
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::labels::class_name;
use crate::{DetectionError, DetectorConfig};

/// Axis-aligned box in source-image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl BoundingBox {
    /// Horizontal center, the coordinate lane bucketing keys on
    pub fn x_center(&self) -> f32 {
        (self.xmin + self.xmax) / 2.0
    }

    /// Intersection-over-union with another box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix = (self.xmax.min(other.xmax) - self.xmin.max(other.xmin)).max(0.0);
        let iy = (self.ymax.min(other.ymax) - self.ymin.max(other.ymin)).max(0.0);
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }

    fn area(&self) -> f32 {
        (self.xmax - self.xmin).max(0.0) * (self.ymax - self.ymin).max(0.0)
    }
}

/// One object instance reported by the detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box; absent when the model reports a box-less hit
    pub bbox: Option<BoundingBox>,

    /// Class label
    pub label: String,

    /// Detection confidence in [0, 1]
    pub confidence: f32,
}

/// Detection capability consumed by the request pipeline
pub trait Detector: Send + Sync {
    /// Detect objects in one frame
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, DetectionError>;
}

/// YOLOv8 detector; serves mock detections when no model is configured
pub struct YoloDetector {
    config: DetectorConfig,
    session: Option<Session>,
}

impl YoloDetector {
    pub fn new(config: DetectorConfig) -> Result<Self, DetectionError> {
        let session = if let Some(path) = &config.model_path {
            info!("Loading detection model from {}", path);
            match Session::builder() {
                Ok(builder) => {
                    match builder.with_optimization_level(GraphOptimizationLevel::Level3) {
                        Ok(builder) => match builder.commit_from_file(path) {
                            Ok(s) => Some(s),
                            Err(e) => {
                                error!("Failed to load detection model: {}", e);
                                return Err(DetectionError::ModelLoad(e.to_string()));
                            }
                        },
                        Err(e) => {
                            error!("Failed to configure model optimization: {}", e);
                            return Err(DetectionError::ModelLoad(e.to_string()));
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to create session builder: {}", e);
                    return Err(DetectionError::ModelLoad(e.to_string()));
                }
            }
        } else {
            warn!("No detection model path configured. Using mock detections.");
            None
        };

        Ok(Self { config, session })
    }

    /// Mock detector for tests and model-less deployments
    pub fn mock() -> Self {
        Self {
            config: DetectorConfig::default(),
            session: None,
        }
    }

    /// Resize to the model input and pack a normalized CHW tensor
    fn preprocess(&self, image: &DynamicImage) -> Array4<f32> {
        let size = self.config.input_size;
        let resized = image
            .resize_exact(size, size, image::imageops::FilterType::Triangle)
            .to_rgb8();

        let mut input = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }
        input
    }

    fn run_model(
        &self,
        session: &Session,
        image: &DynamicImage,
    ) -> Result<Vec<Detection>, DetectionError> {
        let input = self.preprocess(image);

        let outputs = session
            .run(ort::inputs![input].map_err(|e| DetectionError::Inference(e.to_string()))?)
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let preds = outputs["output0"]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        // YOLOv8 head: [1, 4 + num_classes, num_anchors] with cx/cy/w/h rows
        // followed by per-class scores.
        let shape = preds.shape();
        if shape.len() != 3 || shape[1] < 5 {
            return Err(DetectionError::Inference(format!(
                "unexpected model output shape {:?}",
                shape
            )));
        }
        let num_classes = shape[1] - 4;
        let num_anchors = shape[2];

        let scale_x = image.width() as f32 / self.config.input_size as f32;
        let scale_y = image.height() as f32 / self.config.input_size as f32;

        let mut candidates = Vec::new();
        for anchor in 0..num_anchors {
            let mut best_class = 0;
            let mut best_score = 0.0f32;
            for class in 0..num_classes {
                let score = preds[[0, 4 + class, anchor]];
                if score > best_score {
                    best_score = score;
                    best_class = class;
                }
            }
            if best_score < self.config.confidence_threshold {
                continue;
            }

            let cx = preds[[0, 0, anchor]];
            let cy = preds[[0, 1, anchor]];
            let w = preds[[0, 2, anchor]];
            let h = preds[[0, 3, anchor]];

            candidates.push(Detection {
                bbox: Some(BoundingBox {
                    xmin: (cx - w / 2.0) * scale_x,
                    ymin: (cy - h / 2.0) * scale_y,
                    xmax: (cx + w / 2.0) * scale_x,
                    ymax: (cy + h / 2.0) * scale_y,
                }),
                label: class_name(best_class).to_string(),
                confidence: best_score,
            });
        }

        let detections = non_max_suppression(candidates, self.config.iou_threshold);
        debug!("{} detections above threshold after NMS", detections.len());
        Ok(detections)
    }
}

impl Detector for YoloDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, DetectionError> {
        if let Some(session) = &self.session {
            self.run_model(session, image)
        } else {
            Ok(mock_detections(image.width(), image.height()))
        }
    }
}

/// Greedy IoU suppression, highest confidence first, per class
fn non_max_suppression(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for det in candidates {
        let bbox = match det.bbox {
            Some(b) => b,
            None => continue,
        };
        let suppressed = kept.iter().any(|k| {
            k.label == det.label
                && k.bbox
                    .map(|kb| kb.iou(&bbox) > iou_threshold)
                    .unwrap_or(false)
        });
        if !suppressed {
            kept.push(det);
        }
    }
    kept
}

/// Mock street scene spread across the frame width
fn mock_detections(width: u32, height: u32) -> Vec<Detection> {
    let w = width as f32;
    let h = height as f32;
    let boxed = |label: &str, x_frac: f32, confidence: f32| Detection {
        bbox: Some(BoundingBox {
            xmin: w * (x_frac - 0.05),
            ymin: h * 0.4,
            xmax: w * (x_frac + 0.05),
            ymax: h * 0.7,
        }),
        label: label.to_string(),
        confidence,
    };

    vec![
        boxed("car", 0.10, 0.91),
        boxed("car", 0.18, 0.87),
        boxed("truck", 0.40, 0.78),
        boxed("car", 0.62, 0.83),
        boxed("person", 0.88, 0.66),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> BoundingBox {
        BoundingBox {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    #[test]
    fn test_x_center() {
        let b = bbox(10.0, 0.0, 30.0, 50.0);
        assert!((b.x_center() - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_iou_identical_boxes() {
        let b = bbox(0.0, 0.0, 10.0, 10.0);
        assert!((b.iou(&b) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_iou_disjoint_boxes() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        let b = bbox(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_nms_suppresses_overlapping_same_class() {
        let candidates = vec![
            Detection {
                bbox: Some(bbox(0.0, 0.0, 10.0, 10.0)),
                label: "car".to_string(),
                confidence: 0.9,
            },
            Detection {
                bbox: Some(bbox(1.0, 1.0, 11.0, 11.0)),
                label: "car".to_string(),
                confidence: 0.8,
            },
        ];
        let kept = non_max_suppression(candidates, 0.45);
        assert_eq!(kept.len(), 1);
        assert!((kept[0].confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_nms_keeps_overlapping_different_class() {
        let candidates = vec![
            Detection {
                bbox: Some(bbox(0.0, 0.0, 10.0, 10.0)),
                label: "car".to_string(),
                confidence: 0.9,
            },
            Detection {
                bbox: Some(bbox(1.0, 1.0, 11.0, 11.0)),
                label: "truck".to_string(),
                confidence: 0.8,
            },
        ];
        let kept = non_max_suppression(candidates, 0.45);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_nms_drops_boxless_candidates() {
        let candidates = vec![Detection {
            bbox: None,
            label: "car".to_string(),
            confidence: 0.9,
        }];
        assert!(non_max_suppression(candidates, 0.45).is_empty());
    }

    #[test]
    fn test_mock_detector_reports_objects() {
        let detector = YoloDetector::mock();
        let image = DynamicImage::new_rgb8(640, 480);
        let detections = detector.detect(&image).unwrap();
        assert!(!detections.is_empty());
        for det in &detections {
            let b = det.bbox.as_ref().unwrap();
            assert!(b.x_center() >= 0.0 && b.x_center() <= 640.0);
            assert!(det.confidence > 0.0 && det.confidence <= 1.0);
        }
    }
}
