pub mod cookie;
pub mod password;
pub mod validation;

pub use cookie::{expired_token_cookie, token_cookie, TOKEN_COOKIE};
pub use password::{hash_password, verify_password, Password, PasswordHashString};
pub use validation::ValidatedJson;
