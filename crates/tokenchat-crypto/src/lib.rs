/// Tokenchat credential hashing.
///
/// Passwords are stored as Argon2id PHC strings (`$argon2id$v=19$...`), each
/// with its own random salt. The plaintext never leaves the request handler.
pub mod password;

pub use password::{CryptoError, hash_password, verify_password};
