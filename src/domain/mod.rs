pub mod entities;
pub mod errors;
pub mod ports;
pub mod prompt;

pub use entities::*;
pub use errors::{DomainError, Result};
pub use prompt::PromptTemplate;
