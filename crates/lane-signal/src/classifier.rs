//! Frame classification and the greedy signal ranking policy

use std::collections::BTreeMap;

use detection::{Detection, EMERGENCY_CLASSES};
use serde::Serialize;
use tracing::debug;

use crate::lane::{lane_for_x, Lane, LaneState, Signal, DEFAULT_FRAME_WIDTH, LANE_COUNT};

/// Display-only countdown table for live frames, one entry per lane
const LIVE_TIME_LEFT: [u32; LANE_COUNT] = [30, 45, 20, 25];

/// Fully derived per-frame snapshot; never mutated after construction
#[derive(Debug, Clone, Serialize)]
pub struct FrameResult {
    /// Per-lane state, indexed A through D
    pub lanes: [LaneState; LANE_COUNT],

    /// Mean detection confidence across the frame, 0.0 when empty
    pub accuracy_rate: f32,

    /// A priority-class object was detected
    pub emergency_detected: bool,

    /// Lane of the first priority-class detection, when it carried a box
    pub emergency_lane: Option<Lane>,

    /// Label -> occurrence count across all detections, lane-independent
    pub object_counts: BTreeMap<String, u32>,
}

/// Classify one frame of detections into a complete lane snapshot.
///
/// Total over its inputs: zero detections, box-less detections, and an
/// unknown width (falls back to [`DEFAULT_FRAME_WIDTH`]) all yield a
/// structurally complete result.
pub fn classify_frame(detections: &[Detection], width: Option<u32>) -> FrameResult {
    let width = width.filter(|w| *w > 0).unwrap_or(DEFAULT_FRAME_WIDTH);

    let mut counts = [0u32; LANE_COUNT];
    let mut object_counts: BTreeMap<String, u32> = BTreeMap::new();

    for det in detections {
        // A detection without a box cannot be assigned a lane; it still
        // shows up in the display tally.
        if let Some(bbox) = &det.bbox {
            counts[lane_for_x(bbox.x_center(), width).index()] += 1;
        }
        *object_counts.entry(det.label.clone()).or_insert(0) += 1;
    }

    let signals = rank_signals(&counts);
    debug!(?counts, ?signals, "ranked lane occupancy");

    // Only the first priority-class detection, in detector output order, is
    // reported. The flag is advisory: it does not alter the ranking above.
    let mut emergency_detected = false;
    let mut emergency_lane = None;
    for det in detections {
        if EMERGENCY_CLASSES.contains(&det.label.as_str()) {
            emergency_detected = true;
            emergency_lane = det.bbox.as_ref().map(|b| lane_for_x(b.x_center(), width));
            break;
        }
    }

    let accuracy_rate = if detections.is_empty() {
        0.0
    } else {
        detections.iter().map(|d| d.confidence).sum::<f32>() / detections.len() as f32
    };

    FrameResult {
        lanes: std::array::from_fn(|i| LaneState {
            vehicle_count: counts[i],
            signal: signals[i],
            time_left: LIVE_TIME_LEFT[i],
        }),
        accuracy_rate,
        emergency_detected,
        emergency_lane,
        object_counts,
    }
}

/// Assign GREEN/YELLOW/RED from per-lane counts.
///
/// One-shot greedy rule with no memory of prior frames: the busiest
/// non-empty lane goes GREEN, the runner-up (if non-empty) YELLOW, the rest
/// RED. The sort is stable, so on equal counts the lower lane index wins.
pub fn rank_signals(counts: &[u32; LANE_COUNT]) -> [Signal; LANE_COUNT] {
    let mut ranked: [(usize, u32); LANE_COUNT] = std::array::from_fn(|i| (i, counts[i]));
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut signals = [Signal::Red; LANE_COUNT];
    if ranked[0].1 > 0 {
        signals[ranked[0].0] = Signal::Green;
    }
    if ranked[1].1 > 0 {
        signals[ranked[1].0] = Signal::Yellow;
    }
    signals
}
