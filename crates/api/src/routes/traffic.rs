//! Traffic snapshot route

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use lane_signal::{classify_frame, generate_sample, FrameResult, Lane, LaneState, SyntheticFrame};

use crate::error::ApiError;
use crate::AppState;

/// Wire shape for a live frame
#[derive(Debug, Serialize)]
pub struct TrafficResponse {
    #[serde(rename = "lane_A")]
    pub lane_a: LaneState,
    #[serde(rename = "lane_B")]
    pub lane_b: LaneState,
    #[serde(rename = "lane_C")]
    pub lane_c: LaneState,
    #[serde(rename = "lane_D")]
    pub lane_d: LaneState,
    pub accuracy_rate: f32,
    pub emergency_detected: bool,
    pub emergency_lane: Option<Lane>,
    pub object_counts: BTreeMap<String, u32>,
}

impl From<FrameResult> for TrafficResponse {
    fn from(result: FrameResult) -> Self {
        let [lane_a, lane_b, lane_c, lane_d] = result.lanes;
        Self {
            lane_a,
            lane_b,
            lane_c,
            lane_d,
            accuracy_rate: result.accuracy_rate,
            emergency_detected: result.emergency_detected,
            emergency_lane: result.emergency_lane,
            object_counts: result.object_counts,
        }
    }
}

/// Wire shape for a demo frame; no accuracy or emergency fields
#[derive(Debug, Serialize)]
pub struct SampleResponse {
    #[serde(rename = "lane_A")]
    pub lane_a: LaneState,
    #[serde(rename = "lane_B")]
    pub lane_b: LaneState,
    #[serde(rename = "lane_C")]
    pub lane_c: LaneState,
    #[serde(rename = "lane_D")]
    pub lane_d: LaneState,
    pub object_counts: BTreeMap<String, u32>,
}

impl From<SyntheticFrame> for SampleResponse {
    fn from(sample: SyntheticFrame) -> Self {
        let [lane_a, lane_b, lane_c, lane_d] = sample.lanes;
        Self {
            lane_a,
            lane_b,
            lane_c,
            lane_d,
            object_counts: sample.object_counts,
        }
    }
}

/// Process one traffic frame.
///
/// With an image part: detect, classify, return the full lane snapshot.
/// Without one: return a synthetic sample so the display stays live.
/// Either path requires the detection collaborator to have initialized.
pub async fn process_frame(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    metrics::counter!("traffic_requests_total").increment(1);

    let detector = state
        .detector
        .clone()
        .ok_or(ApiError::DetectorUnavailable)?;

    match read_image_part(&mut multipart).await? {
        Some(bytes) => {
            let image = image::load_from_memory(&bytes).map_err(|e| {
                warn!("Rejecting undecodable image payload: {}", e);
                ApiError::RequestProcessing(format!("Failed to decode image: {}", e))
            })?;

            let detections = detector.detect(&image)?;
            let result = classify_frame(&detections, Some(image.width()));
            info!(
                "Classified frame: {} detections, accuracy {:.2}",
                detections.len(),
                result.accuracy_rate
            );

            Ok(Json(TrafficResponse::from(result)).into_response())
        }
        None => {
            info!("No image supplied, returning synthetic sample");
            Ok(Json(SampleResponse::from(generate_sample())).into_response())
        }
    }
}

/// Pull the optional `image` part out of the multipart body.
///
/// An empty part is treated the same as an absent one.
async fn read_image_part(multipart: &mut Multipart) -> Result<Option<Bytes>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::RequestProcessing(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::RequestProcessing(format!("Failed to read image: {}", e)))?;
            if bytes.is_empty() {
                return Ok(None);
            }
            return Ok(Some(bytes));
        }
    }
    Ok(None)
}

/// Informational root route
pub async fn index() -> Html<&'static str> {
    Html("Traffic signal snapshot service. POST a frame to <a href=\"/api/traffic\">/api/traffic</a>.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use detection::{BoundingBox, Detection};

    fn det(label: &str, x_center: f32, confidence: f32) -> Detection {
        Detection {
            bbox: Some(BoundingBox {
                xmin: x_center - 5.0,
                ymin: 0.0,
                xmax: x_center + 5.0,
                ymax: 40.0,
            }),
            label: label.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_live_wire_shape() {
        let detections = vec![det("car", 100.0, 0.9), det("ambulance", 50.0, 0.8)];
        let response = TrafficResponse::from(classify_frame(&detections, Some(640)));
        let value = serde_json::to_value(&response).unwrap();

        for key in ["lane_A", "lane_B", "lane_C", "lane_D"] {
            let lane = &value[key];
            assert!(lane["vehicle_count"].is_u64());
            assert!(lane["signal"].is_string());
            assert!(lane["time_left"].is_u64());
        }
        assert_eq!(value["emergency_detected"], true);
        assert_eq!(value["emergency_lane"], "A");
        assert_eq!(value["object_counts"]["car"], 1);
        assert!(value["accuracy_rate"].is_number());
    }

    #[test]
    fn test_live_wire_shape_null_emergency_lane() {
        let response = TrafficResponse::from(classify_frame(&[], Some(640)));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["emergency_detected"], false);
        assert!(value["emergency_lane"].is_null());
    }

    #[test]
    fn test_sample_wire_shape_omits_live_only_fields() {
        let response = SampleResponse::from(generate_sample());
        let value = serde_json::to_value(&response).unwrap();

        assert!(value.get("accuracy_rate").is_none());
        assert!(value.get("emergency_detected").is_none());
        assert!(value.get("emergency_lane").is_none());
        for key in ["lane_A", "lane_B", "lane_C", "lane_D"] {
            assert!(value[key]["signal"].is_string());
        }
        assert!(value["object_counts"].is_object());
    }
}
