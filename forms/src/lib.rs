mod login;
mod signup;

pub use login::{Credentials, LoginField, LoginForm};
pub use signup::{Field, SignupData, SignupForm};
