//! stakenet-genesis
//!
//! Everything that happens before the network starts:
//!
//! 1. Validate operator parameters (`params`)
//! 2. Generate the owner and validator identities (`identity`) and store
//!    their keys (`keystore`)
//! 3. Write the shell environment artifact (`env_file`) and the structured
//!    bootstrap record (`prepare`)
//! 4. Compose the finalized chain specification with one enode per node
//!    (`spec`)

pub mod env_file;
pub mod identity;
pub mod keystore;
pub mod params;
pub mod prepare;
pub mod spec;

pub use identity::{BootstrapRecord, IdentityRecord, IdentitySet, ValidatorAddresses, ValidatorIdentity};
pub use keystore::KeyStore;
pub use params::{NetworkParams, RawNetworkParams};
pub use prepare::{prepare_environment, PrepareOutcome, WorkspacePaths};
pub use spec::{compose, compose_with, load_base_spec, ChainSpecification, ComposeOptions, Topology};
