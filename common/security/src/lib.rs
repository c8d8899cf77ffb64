pub mod context;
pub mod error;
pub mod policy;
pub mod roles;

pub use context::{AuthHeader, SecurityContext, SecurityCtxExtractor};
pub use error::SecurityError;
pub use policy::{ensure_capability, Capability};
pub use roles::Role;
