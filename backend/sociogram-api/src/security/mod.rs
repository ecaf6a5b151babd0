/// Credential handling
pub mod password;

pub use password::{
    hash_password, validate_password_strength, verify_dummy_password, verify_password,
};
