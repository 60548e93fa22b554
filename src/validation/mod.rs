//! Input validation for caller-supplied values.

mod identity;

pub use identity::{MAX_USER_ID_LEN, ValidationError, validate_user_id};
