use std::io::{self, Write};

use anyhow::Result;
use chrono::Utc;
use confab_client::{Field, LoadingFlag, SignupForm, UserDataService, submit_signup};

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let api_url =
        std::env::var("CONFAB_API").unwrap_or_else(|_| "http://localhost:5095".to_string());

    let mut form = SignupForm::new();
    form.set_field(Field::Username, prompt("Username (15 char max)")?);
    form.set_field(Field::FirstName, prompt("First name")?);
    form.set_field(Field::LastName, prompt("Last name")?);
    form.set_field(Field::DateOfBirth, prompt("Date of birth (YYYY-MM-DD)")?);
    form.set_field(Field::Password, prompt("Password")?);
    form.set_field(Field::ConfirmPassword, prompt("Confirm password")?);

    let service = UserDataService::new(api_url);
    let loader = LoadingFlag::new();

    match submit_signup(&mut form, Utc::now().date_naive(), &service, &loader).await {
        Some(user) => println!("Account created for {}", user.user_name),
        None => {
            for field in [
                Field::Username,
                Field::FirstName,
                Field::LastName,
                Field::DateOfBirth,
                Field::Password,
                Field::ConfirmPassword,
            ] {
                if let Some(error) = form.error(field) {
                    println!("{}", error);
                }
            }
            if !form.has_errors() {
                println!("Account creation failed, see log for details");
            }
        }
    }

    Ok(())
}
