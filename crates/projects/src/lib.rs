//! Projects / transactions (pure domain, no IO).
//!
//! A project is one build-and-sell transaction: the property, its buyer and
//! realtor, the closing price, the build and warranty windows, and the
//! policies covering the site.

pub mod project;

pub use project::{Project, ProjectStatus, ProjectSummary, PROJECTS_TABLE};
