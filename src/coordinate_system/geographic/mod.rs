mod llbbox;
mod llpoint;

pub use llbbox::{LLBBox, MAX_AREA_SQ_DEGREES};
pub use llpoint::LLPoint;
