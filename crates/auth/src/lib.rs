//! `storekeep-auth` — authentication primitives.
//!
//! Pure credential and token logic, decoupled from HTTP and storage:
//! bcrypt password hashing, HS256 token issuance/verification, and
//! single-use password-reset grants.

pub mod claims;
pub mod password;
pub mod reset;
pub mod roles;
pub mod token;
pub mod user;

pub use claims::{validate_claims, Claims, TokenValidationError};
pub use password::{hash_password, verify_password, PasswordError, DEFAULT_COST};
pub use reset::{ResetToken, RESET_TOKEN_TTL_HOURS};
pub use roles::Role;
pub use token::{Hs256Jwt, TokenError};
pub use user::{normalize_email, NewUser, User, UserProfile};
