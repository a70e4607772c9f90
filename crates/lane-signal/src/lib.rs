//! Lane occupancy and signal assignment
//!
//! Partitions a frame's detections into four vertical lanes and derives a
//! discrete signal state per lane from relative occupancy:
//! - Quartile lane bucketing over the image width
//! - Greedy GREEN/YELLOW ranking by per-lane vehicle count
//! - Advisory emergency-vehicle flagging
//! - Synthetic demo frames that reuse the live ranking policy
//!
//! Everything here is a pure function of its inputs; there is no state
//! carried between frames.

pub mod classifier;
pub mod lane;
pub mod sample;

pub use classifier::{classify_frame, rank_signals, FrameResult};
pub use lane::{lane_for_x, Lane, LaneState, Signal, DEFAULT_FRAME_WIDTH, LANE_COUNT};
pub use sample::{generate_sample, SyntheticFrame};
