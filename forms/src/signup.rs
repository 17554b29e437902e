use std::collections::HashMap;

use chrono::NaiveDate;

const DOB_FORMAT: &str = "%Y-%m-%d";
const PASSWORD_SYMBOLS: &str = "@$!%*?&";

const DOB_ERROR: &str = "You must be at least 18 years old to sign up";
const PASSWORD_ERROR: &str = "Password must contain at least 8 characters, one lowercase letter, one uppercase letter, one number, and one symbol";
const CONFIRM_ERROR: &str = "Confirm password does not match";

/// The fields of the signup form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Username,
    FirstName,
    LastName,
    DateOfBirth,
    Password,
    ConfirmPassword,
}

/// Validated, normalized account-creation data produced by a successful
/// submit.
#[derive(Debug, Clone, PartialEq)]
pub struct SignupData {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub password: String,
}

/// Signup form state: one string value per field and at most one error
/// message per field.
///
/// Validation runs at submit time only. Editing a field clears that field's
/// error immediately; other fields' errors are left alone.
#[derive(Debug, Default)]
pub struct SignupForm {
    username: String,
    first_name: String,
    last_name: String,
    date_of_birth: String,
    password: String,
    confirm_password: String,
    errors: HashMap<Field, String>,
}

impl SignupForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a keystroke's worth of input, clearing any stale error on the
    /// edited field.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.errors.remove(&field);
        let value = value.into();
        match field {
            Field::Username => self.username = value,
            Field::FirstName => self.first_name = value,
            Field::LastName => self.last_name = value,
            Field::DateOfBirth => self.date_of_birth = value,
            Field::Password => self.password = value,
            Field::ConfirmPassword => self.confirm_password = value,
        }
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Username => &self.username,
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::DateOfBirth => &self.date_of_birth,
            Field::Password => &self.password,
            Field::ConfirmPassword => &self.confirm_password,
        }
    }

    /// The current validation error for a field, if any
    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Validate and, if clean, hand back the normalized signup data.
    ///
    /// `today` is supplied by the caller so the age check is deterministic.
    /// On failure the error map is replaced with the fresh set of errors and
    /// `None` is returned.
    pub fn submit(&mut self, today: NaiveDate) -> Option<SignupData> {
        let mut errors = HashMap::new();

        let dob = NaiveDate::parse_from_str(&self.date_of_birth, DOB_FORMAT).ok();
        match dob {
            Some(date) if age_in_years(date, today) >= 18.0 => {}
            _ => {
                errors.insert(Field::DateOfBirth, DOB_ERROR.to_string());
            }
        }

        if !password_meets_policy(&self.password) {
            errors.insert(Field::Password, PASSWORD_ERROR.to_string());
        }

        if self.password != self.confirm_password {
            errors.insert(Field::ConfirmPassword, CONFIRM_ERROR.to_string());
        }

        if errors.is_empty()
            && let Some(date_of_birth) = dob
        {
            self.errors.clear();
            return Some(SignupData {
                username: self.username.clone(),
                first_name: self.first_name.clone(),
                last_name: self.last_name.clone(),
                date_of_birth,
                password: self.password.clone(),
            });
        }

        self.errors = errors;
        None
    }
}

/// Age in 365.25-day years
fn age_in_years(date_of_birth: NaiveDate, today: NaiveDate) -> f64 {
    (today - date_of_birth).num_days() as f64 / 365.25
}

/// At least 8 characters with one lowercase letter, one uppercase letter,
/// one digit, and one symbol from the allowed set; nothing outside that
/// alphabet.
fn password_meets_policy(password: &str) -> bool {
    password.len() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 5).unwrap()
    }

    fn filled_form(dob: &str) -> SignupForm {
        let mut form = SignupForm::new();
        form.set_field(Field::Username, "ab");
        form.set_field(Field::FirstName, "Ada");
        form.set_field(Field::LastName, "Byron");
        form.set_field(Field::DateOfBirth, dob);
        form.set_field(Field::Password, "Abcdef1!");
        form.set_field(Field::ConfirmPassword, "Abcdef1!");
        form
    }

    #[test]
    fn test_submit_valid_form() {
        let mut form = filled_form("2006-08-05");

        let data = form.submit(today()).expect("submission should succeed");

        assert_eq!(data.username, "ab");
        assert_eq!(data.first_name, "Ada");
        assert_eq!(
            data.date_of_birth,
            NaiveDate::from_ymd_opt(2006, 8, 5).unwrap()
        );
        assert!(!form.has_errors());
    }

    #[test]
    fn test_age_just_over_boundary() {
        // 2008-08-05 is 6575 days before 2026-08-05: 18.0013 years.
        let mut form = filled_form("2008-08-05");

        assert!(form.submit(today()).is_some());
        assert_eq!(form.error(Field::DateOfBirth), None);
    }

    #[test]
    fn test_age_just_under_boundary() {
        // One day later: 6574 days, 17.9986 years.
        let mut form = filled_form("2008-08-06");

        assert!(form.submit(today()).is_none());
        assert_eq!(form.error(Field::DateOfBirth), Some(DOB_ERROR));
    }

    #[test]
    fn test_unparseable_dob_fails_age_check() {
        let mut form = filled_form("not-a-date");

        assert!(form.submit(today()).is_none());
        assert_eq!(form.error(Field::DateOfBirth), Some(DOB_ERROR));
    }

    #[test]
    fn test_password_missing_each_class() {
        for password in ["abcdefgh", "ABCDEF1!", "abcdef1!", "Abcdefg!", "Abcdefg1"] {
            let mut form = filled_form("2000-01-01");
            form.set_field(Field::Password, password);
            form.set_field(Field::ConfirmPassword, password);

            assert!(form.submit(today()).is_none(), "accepted {:?}", password);
            assert_eq!(form.error(Field::Password), Some(PASSWORD_ERROR));
        }
    }

    #[test]
    fn test_password_too_short() {
        let mut form = filled_form("2000-01-01");
        form.set_field(Field::Password, "Ab1!");
        form.set_field(Field::ConfirmPassword, "Ab1!");

        assert!(form.submit(today()).is_none());
        assert_eq!(form.error(Field::Password), Some(PASSWORD_ERROR));
    }

    #[test]
    fn test_password_with_disallowed_symbol() {
        let mut form = filled_form("2000-01-01");
        form.set_field(Field::Password, "Abcdef1#");
        form.set_field(Field::ConfirmPassword, "Abcdef1#");

        assert!(form.submit(today()).is_none());
        assert_eq!(form.error(Field::Password), Some(PASSWORD_ERROR));
    }

    #[test]
    fn test_confirmation_mismatch() {
        let mut form = filled_form("2000-01-01");
        form.set_field(Field::ConfirmPassword, "Abcdef1?");

        assert!(form.submit(today()).is_none());
        assert_eq!(form.error(Field::ConfirmPassword), Some(CONFIRM_ERROR));
        assert_eq!(form.error(Field::Password), None);
    }

    #[test]
    fn test_editing_clears_only_that_fields_error() {
        let mut form = filled_form("2010-01-01");
        form.set_field(Field::Password, "weak");
        form.set_field(Field::ConfirmPassword, "weak");

        assert!(form.submit(today()).is_none());
        assert!(form.error(Field::DateOfBirth).is_some());
        assert!(form.error(Field::Password).is_some());

        form.set_field(Field::Password, "Abcdef1!");

        assert_eq!(form.error(Field::Password), None);
        assert!(form.error(Field::DateOfBirth).is_some());
    }

    #[test]
    fn test_weak_password_blocks_submission() {
        let mut form = filled_form("2000-01-01");
        form.set_field(Field::Password, "abcdefgh");
        form.set_field(Field::ConfirmPassword, "abcdefgh");

        assert!(form.submit(today()).is_none());
        assert!(form.error(Field::Password).is_some());
    }

    #[test]
    fn test_revalidation_replaces_stale_errors() {
        let mut form = filled_form("2010-01-01");
        assert!(form.submit(today()).is_none());

        form.set_field(Field::DateOfBirth, "2000-01-01");
        assert!(form.submit(today()).is_some());
        assert!(!form.has_errors());
    }
}
