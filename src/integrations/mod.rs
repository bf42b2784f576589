//! Third-party data source integrations.

pub mod sources {
    pub use crate::sources::*;
}

pub mod lead_store {
    pub use crate::lead_store::*;
}
