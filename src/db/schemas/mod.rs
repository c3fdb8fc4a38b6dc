//! Database schemas for tokengate

mod metadata;
mod principal;

pub use metadata::Metadata;
pub use principal::{PrincipalDoc, PRINCIPAL_COLLECTION};
