//! Configuration bundle assembly
//!
//! A bundle is a throwaway Home Assistant configuration directory holding a
//! copy of the blueprint under test, the fixture entities it needs, and one
//! automation instantiating it. Bundles are self-contained and removed when
//! dropped unless retained.
//!
//! # Example
//!
//! ```ignore
//! use ha_bundle::{create_bundle, BundleRootGenerator, RootSeed};
//!
//! let roots = BundleRootGenerator::in_temp_dir();
//! let root = roots.root_for(&RootSeed::random());
//! let bundle = create_bundle(&root, &blueprint, &assignment, &fixtures)?;
//! // ... run the checker against bundle.root() ...
//! let kept = bundle.retain();
//! ```

mod assembler;
mod bundle;
mod configuration;
mod error;
mod root;

pub use assembler::{check_consistency, create_bundle};
pub use bundle::ConfigBundle;
pub use configuration::{
    blueprint_relative_path, build_configuration, use_blueprint_path, AUTOMATION_ID,
    BLUEPRINT_NAMESPACE, CONFIGURATION_FILE,
};
pub use error::{BundleError, BundleResult};
pub use root::{BundleRootGenerator, RootSeed, BUNDLE_PREFIX};
