// Scoring pipeline modules and shared errors/models
pub mod nutrition {
    pub use crate::nutrition::*;
}

pub mod features {
    pub use crate::features::*;
}

pub mod predictor {
    pub use crate::predictor::*;
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
