//! Scene Description
//!
//! Aggregates a frame's detections into counts and top objects, and
//! phrases them as a short spoken description.

mod describer;

pub use describer::{
    describe, detection_list, SceneSummary, MAX_POSITIONAL_CLAUSES, NO_OBJECTS_MESSAGE,
};
