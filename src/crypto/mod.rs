pub mod password;

pub use password::*;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PasswordError {
    #[error("Password must not be empty")]
    Empty,

    #[error("Malformed password hash")]
    MalformedHash,

    #[error("Iteration count must be positive")]
    InvalidIterations,
}
