use crate::account::{User, UserDataService};

/// Signed-in state backing the left-panel header.
#[derive(Debug, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_user(&mut self, user: User) {
        self.user = Some(user);
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// "First Last" for the header, if anyone is signed in
    pub fn display_name(&self) -> Option<String> {
        self.user
            .as_ref()
            .map(|user| format!("{} {}", user.first_name, user.last_name))
    }

    /// The logout control is only offered when a username is present.
    pub fn can_logout(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| !user.user_name.is_empty())
    }

    /// Log out remotely, clearing the session only once the service agrees.
    ///
    /// A failed call leaves the session signed in; there is no retry and no
    /// timeout beyond the transport's own.
    pub async fn logout(&mut self, service: &UserDataService) {
        if !self.can_logout() {
            return;
        }
        let Some(username) = self.user.as_ref().map(|user| user.user_name.clone()) else {
            return;
        };

        match service.logout_user(&username).await {
            Ok(()) => {
                self.user = None;
                tracing::info!(user = %username, "Logged out");
            }
            Err(e) => {
                tracing::error!(error = %e, "Logout failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ada() -> User {
        User {
            user_name: "ada".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Byron".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1815, 12, 10).unwrap(),
        }
    }

    #[test]
    fn test_display_name() {
        let mut session = Session::new();
        assert_eq!(session.display_name(), None);

        session.set_user(ada());

        assert_eq!(session.display_name(), Some("Ada Byron".to_string()));
    }

    #[test]
    fn test_can_logout_requires_username() {
        let mut session = Session::new();
        assert!(!session.can_logout());

        let mut anonymous = ada();
        anonymous.user_name = String::new();
        session.set_user(anonymous);
        assert!(!session.can_logout());

        session.set_user(ada());
        assert!(session.can_logout());
    }
}
