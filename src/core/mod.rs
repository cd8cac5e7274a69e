// Core exports
pub mod classifier;
pub mod profile;
pub mod registry;
pub mod source;

pub use classifier::{classify, Classifier, ClassifyError};
pub use profile::{CompareError, LoadError, NgramProfile, NgramProfiler, ProfileBuilder};
pub use registry::{build_registry, initialize, LoadOptions, Registry, StartupError};
pub use source::{discover, label_of, supported_bodies, DiscoveryError};
