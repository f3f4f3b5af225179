mod normalizer;
mod validator;

pub use normalizer::{normalize, ROLE_WORDS};
pub use validator::is_likely_address;
