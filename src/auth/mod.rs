//! Authentication core: credential hashing, token service and request guard.

pub mod guard;
pub mod password;
pub mod token;

pub use guard::{authenticate, AuthRejection};
pub use token::{TokenPayload, TokenService};
