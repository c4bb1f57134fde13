//! Web Access Control authorization engine (spec.md component C9).

pub mod authorization;
pub mod engine;

pub use authorization::{parse_authorizations, Authorization, Mode};
pub use engine::{required_modes, AclWebAcEngine, WebAcEngine};
