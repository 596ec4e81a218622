pub mod constants;
pub mod error;
pub mod hash;
pub mod types;

pub use constants::*;
pub use error::BootstrapError;
pub use hash::keccak256;
pub use types::*;
