use std::collections::HashMap;

const USERNAME_ERROR: &str = "Username is required";
const PASSWORD_ERROR: &str = "Password is required";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginField {
    Username,
    Password,
}

/// Credentials produced by a successful login submit
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Login form state, same per-field error discipline as the signup form.
#[derive(Debug, Default)]
pub struct LoginForm {
    username: String,
    password: String,
    errors: HashMap<LoginField, String>,
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_field(&mut self, field: LoginField, value: impl Into<String>) {
        self.errors.remove(&field);
        let value = value.into();
        match field {
            LoginField::Username => self.username = value,
            LoginField::Password => self.password = value,
        }
    }

    pub fn error(&self, field: LoginField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Require both fields, then hand back the credentials.
    pub fn submit(&mut self) -> Option<Credentials> {
        let mut errors = HashMap::new();

        if self.username.is_empty() {
            errors.insert(LoginField::Username, USERNAME_ERROR.to_string());
        }
        if self.password.is_empty() {
            errors.insert(LoginField::Password, PASSWORD_ERROR.to_string());
        }

        if errors.is_empty() {
            self.errors.clear();
            return Some(Credentials {
                username: self.username.clone(),
                password: self.password.clone(),
            });
        }

        self.errors = errors;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_requires_both_fields() {
        let mut form = LoginForm::new();

        assert!(form.submit().is_none());
        assert_eq!(form.error(LoginField::Username), Some(USERNAME_ERROR));
        assert_eq!(form.error(LoginField::Password), Some(PASSWORD_ERROR));
    }

    #[test]
    fn test_editing_clears_only_that_fields_error() {
        let mut form = LoginForm::new();
        assert!(form.submit().is_none());

        form.set_field(LoginField::Username, "ada");

        assert_eq!(form.error(LoginField::Username), None);
        assert!(form.error(LoginField::Password).is_some());
    }

    #[test]
    fn test_submit_with_credentials() {
        let mut form = LoginForm::new();
        form.set_field(LoginField::Username, "ada");
        form.set_field(LoginField::Password, "Abcdef1!");

        let credentials = form.submit().expect("should produce credentials");

        assert_eq!(credentials.username, "ada");
        assert_eq!(credentials.password, "Abcdef1!");
    }
}
