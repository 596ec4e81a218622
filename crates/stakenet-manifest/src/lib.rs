//! stakenet-manifest
//!
//! Container manifests for a freshly composed network, written under the
//! `nodes/` directory next to `spec.json`:
//!
//!   ethstats/docker-compose.yml     — telemetry dashboard
//!   validator<i>/docker-compose.yml — one mining node per validator
//!   archive/docker-compose.yml      — archive / JSON-RPC node
//!   run_all.sh, stop_all.sh         — start and stop everything in order

pub mod compose;
pub mod render;
pub mod scripts;

pub use compose::{ComposeFile, Logging, Service};
pub use render::{generate_secret, render, ManifestConfig, ManifestSet, RenderedFile};
