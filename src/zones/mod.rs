mod classifier;
mod registry;

pub use classifier::{ZoneClassifier, ZoneMatch};
pub use registry::{Zone, ZoneRegistry, ZoneRegistryBuilder, DEFAULT_DEVICE, UNMATCHED_ZONE};
