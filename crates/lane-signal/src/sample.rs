//! Synthetic demo frames
//!
//! When no image is supplied the service still returns a lane snapshot. The
//! generator draws random occupancy per lane and applies the same ranking
//! policy as the live classifier, so demo output is policy-consistent with
//! live output.

use std::collections::BTreeMap;

use rand::Rng;
use serde::Serialize;

use crate::classifier::rank_signals;
use crate::lane::{LaneState, LANE_COUNT};

/// Classes drawn for demo frames
const SAMPLE_CLASSES: [&str; 5] = ["car", "bus", "truck", "motorcycle", "person"];

/// Max random count per class per lane
const MAX_CLASS_COUNT: u32 = 20;

/// Demo-mode snapshot; no emergency or accuracy fields
#[derive(Debug, Clone, Serialize)]
pub struct SyntheticFrame {
    /// Per-lane state, indexed A through D
    pub lanes: [LaneState; LANE_COUNT],

    /// Label -> count summed across lanes
    pub object_counts: BTreeMap<String, u32>,
}

/// Generate a self-consistent fake lane state
pub fn generate_sample() -> SyntheticFrame {
    let mut rng = rand::thread_rng();

    let mut counts = [0u32; LANE_COUNT];
    let mut times = [0u32; LANE_COUNT];
    let mut object_counts: BTreeMap<String, u32> = BTreeMap::new();

    for lane in 0..LANE_COUNT {
        for class in SAMPLE_CLASSES {
            let n = rng.gen_range(0..=MAX_CLASS_COUNT);
            counts[lane] += n;
            *object_counts.entry(class.to_string()).or_insert(0) += n;
        }
        times[lane] = rng.gen_range(10..=60);
    }

    let signals = rank_signals(&counts);

    SyntheticFrame {
        lanes: std::array::from_fn(|i| LaneState {
            vehicle_count: counts[i],
            signal: signals[i],
            time_left: times[i],
        }),
        object_counts,
    }
}
