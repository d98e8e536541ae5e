mod anchor;
mod result;
mod scale;

pub use anchor::anchor;
pub use result::DetectionBox;
pub use scale::{scale, CoordinateScaler, Resolution};
