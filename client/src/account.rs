use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use confab_forms::{Credentials, LoginForm, SignupData, SignupForm};

/// A user record as the user-data service returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
}

/// Normalized account-creation body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewUserRequest {
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub password: String,
}

impl From<SignupData> for NewUserRequest {
    fn from(data: SignupData) -> Self {
        Self {
            user_name: data.username,
            first_name: data.first_name,
            last_name: data.last_name,
            date_of_birth: data.date_of_birth,
            password: data.password,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct LoginRequest<'a> {
    user_name: &'a str,
    password: &'a str,
}

/// HTTP client for the remote user-data service
pub struct UserDataService {
    http: reqwest::Client,
    base_url: String,
}

impl UserDataService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn create_new_user(&self, request: &NewUserRequest) -> Result<User> {
        let response = self
            .http
            .post(format!("{}/api/users", self.base_url))
            .json(request)
            .send()
            .await
            .context("Account creation request failed")?;

        let user = response
            .error_for_status()
            .context("Account creation rejected")?
            .json::<User>()
            .await
            .context("Invalid account creation response")?;

        Ok(user)
    }

    pub async fn login_user(&self, credentials: &Credentials) -> Result<User> {
        let response = self
            .http
            .post(format!("{}/api/login", self.base_url))
            .json(&LoginRequest {
                user_name: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await
            .context("Login request failed")?;

        let user = response
            .error_for_status()
            .context("Login rejected")?
            .json::<User>()
            .await
            .context("Invalid login response")?;

        Ok(user)
    }

    /// The username travels as a query parameter, like the hub identity.
    pub async fn logout_user(&self, username: &str) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/api/logout", self.base_url))
            .query(&[("user", username)])
            .send()
            .await
            .context("Logout request failed")?;

        response.error_for_status().context("Logout rejected")?;
        Ok(())
    }
}

/// Shared show/hide state for a loading indicator
#[derive(Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn hide(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_visible(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Validate the signup form and, if clean, create the account.
///
/// The loading flag is shown around the remote call and hidden again on
/// both the success and failure paths. Remote failures are logged and yield
/// `None`; validation failures land in the form's error map.
pub async fn submit_signup(
    form: &mut SignupForm,
    today: NaiveDate,
    service: &UserDataService,
    loader: &LoadingFlag,
) -> Option<User> {
    let data = form.submit(today)?;

    loader.show();
    let result = service.create_new_user(&NewUserRequest::from(data)).await;
    loader.hide();

    match result {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::error!(error = %e, "Account creation failed");
            None
        }
    }
}

/// Same shape as [`submit_signup`], over the login endpoint.
pub async fn submit_login(
    form: &mut LoginForm,
    service: &UserDataService,
    loader: &LoadingFlag,
) -> Option<User> {
    let credentials = form.submit()?;

    loader.show();
    let result = service.login_user(&credentials).await;
    loader.hide();

    match result {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::error!(error = %e, "Login failed");
            None
        }
    }
}
