// Domain-layer modules and shared errors/models
pub mod enrichment {
    pub use crate::enrichment::*;
}

pub mod coordinator {
    pub use crate::coordinator::*;
}

pub mod fusion {
    pub use crate::fusion::*;
}

pub mod scoring {
    pub use crate::scoring::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
