pub mod error;
pub mod password;
pub mod response;
pub mod validation;

pub use error::AppError;
pub use password::CredentialHasher;
pub use validation::ValidatedForm;
