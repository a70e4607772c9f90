//! Lane and signal primitives

use serde::{Deserialize, Serialize};

/// Number of fixed vertical lanes
pub const LANE_COUNT: usize = 4;

/// Assumed frame width (pixels) when the source width is unknown
pub const DEFAULT_FRAME_WIDTH: u32 = 640;

/// One of four fixed vertical quartiles of the image width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lane {
    A,
    B,
    C,
    D,
}

impl Lane {
    /// All lanes in index order
    pub const ALL: [Lane; LANE_COUNT] = [Lane::A, Lane::B, Lane::C, Lane::D];

    /// Zero-based lane index
    pub fn index(&self) -> usize {
        match self {
            Lane::A => 0,
            Lane::B => 1,
            Lane::C => 2,
            Lane::D => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Lane> {
        Lane::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::A => "A",
            Lane::B => "B",
            Lane::C => "C",
            Lane::D => "D",
        }
    }
}

/// Discrete per-lane signal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Red,
    Yellow,
    Green,
}

/// Per-lane snapshot state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneState {
    /// Objects bucketed into this lane
    pub vehicle_count: u32,

    /// Signal derived from relative occupancy
    pub signal: Signal,

    /// Display-only countdown (seconds)
    pub time_left: u32,
}

/// Map an x-center (pixels) to its lane.
///
/// Lane `i` owns x-centers in `[width*i/4, width*(i+1)/4)`. The last bucket
/// is closed on the right, so centers at or beyond `0.75 * width` land in D.
pub fn lane_for_x(x_center: f32, width: u32) -> Lane {
    let w = width as f32;
    if x_center < w * 0.25 {
        Lane::A
    } else if x_center < w * 0.5 {
        Lane::B
    } else if x_center < w * 0.75 {
        Lane::C
    } else {
        Lane::D
    }
}
