//! Test utilities for pbxgen unit tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::test_support::{GraphFixture, TargetFixture};
//!
//! let graph = GraphFixture::new()
//!     .target(TargetFixture::executable("//tools:gen").sources(&["//tools/gen.cc"]))
//!     .build();
//! ```

pub mod fixtures;

pub use fixtures::*;

/// Product type of application bundles.
pub const APPLICATION: &str = "com.apple.product-type.application";

/// Product type of unit-test bundles.
pub const UNIT_TEST: &str = "com.apple.product-type.bundle.unit-test";

/// Product type of UI-test bundles.
pub const UI_TESTING: &str = "com.apple.product-type.bundle.ui-testing";
