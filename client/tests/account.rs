//! User-data service flows against an in-process HTTP responder.

use chrono::NaiveDate;
use confab_client::{
    Field, LoadingFlag, LoginField, LoginForm, Session, SignupForm, User, UserDataService,
    submit_login, submit_signup,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const ADA_JSON: &str = r#"{"UserName":"ada","FirstName":"Ada","LastName":"Byron","DateOfBirth":"2000-01-01"}"#;

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_headers_end(&buf) {
            let headers = String::from_utf8_lossy(&buf[..pos]).to_string();
            let content_length = headers
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if buf.len() >= pos + 4 + content_length {
                break;
            }
        }
    }
    buf
}

/// Answer exactly one request with a 200 and the given JSON body.
async fn serve_json(listener: TcpListener, body: &'static str) -> Vec<u8> {
    let (mut stream, _) = listener.accept().await.unwrap();
    let request = read_request(&mut stream).await;
    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await.unwrap();
    stream.flush().await.unwrap();
    request
}

fn ada() -> User {
    User {
        user_name: "ada".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Byron".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 5).unwrap()
}

fn valid_form() -> SignupForm {
    let mut form = SignupForm::new();
    form.set_field(Field::Username, "ada");
    form.set_field(Field::FirstName, "Ada");
    form.set_field(Field::LastName, "Byron");
    form.set_field(Field::DateOfBirth, "2000-01-01");
    form.set_field(Field::Password, "Abcdef1!");
    form.set_field(Field::ConfirmPassword, "Abcdef1!");
    form
}

#[tokio::test]
async fn test_submit_signup_creates_account() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_json(listener, ADA_JSON));

    let service = UserDataService::new(format!("http://{}", addr));
    let loader = LoadingFlag::new();
    let mut form = valid_form();

    let user = submit_signup(&mut form, today(), &service, &loader).await;

    assert_eq!(user, Some(ada()));
    assert!(!loader.is_visible());
    assert!(!form.has_errors());

    let request = server.await.unwrap();
    let request = String::from_utf8_lossy(&request);
    assert!(request.starts_with("POST /api/users"));
    assert!(request.contains("\"UserName\":\"ada\""));
    assert!(request.contains("\"DateOfBirth\":\"2000-01-01\""));
}

#[tokio::test]
async fn test_submit_signup_blocked_by_validation_makes_no_request() {
    // Nothing listens on this port; a network call would error loudly.
    let service = UserDataService::new("http://127.0.0.1:1");
    let loader = LoadingFlag::new();
    let mut form = valid_form();
    form.set_field(Field::Password, "abcdefgh");
    form.set_field(Field::ConfirmPassword, "abcdefgh");

    let user = submit_signup(&mut form, today(), &service, &loader).await;

    assert_eq!(user, None);
    assert!(form.error(Field::Password).is_some());
    assert!(!loader.is_visible());
}

#[tokio::test]
async fn test_submit_signup_failure_still_hides_loader() {
    let service = UserDataService::new("http://127.0.0.1:1");
    let loader = LoadingFlag::new();
    let mut form = valid_form();

    let user = submit_signup(&mut form, today(), &service, &loader).await;

    assert_eq!(user, None);
    assert!(!form.has_errors());
    assert!(!loader.is_visible());
}

#[tokio::test]
async fn test_submit_login_returns_user() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_json(listener, ADA_JSON));

    let service = UserDataService::new(format!("http://{}", addr));
    let loader = LoadingFlag::new();
    let mut form = LoginForm::new();
    form.set_field(LoginField::Username, "ada");
    form.set_field(LoginField::Password, "Abcdef1!");

    let user = submit_login(&mut form, &service, &loader).await;

    assert_eq!(user, Some(ada()));
    assert!(!loader.is_visible());

    let request = server.await.unwrap();
    let request = String::from_utf8_lossy(&request);
    assert!(request.starts_with("POST /api/login"));
    assert!(request.contains("\"Password\":\"Abcdef1!\""));
}

#[tokio::test]
async fn test_logout_success_clears_session() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_json(listener, "{}"));

    let service = UserDataService::new(format!("http://{}", addr));
    let mut session = Session::new();
    session.set_user(ada());

    session.logout(&service).await;

    assert!(session.user().is_none());
    assert!(!session.can_logout());

    let request = server.await.unwrap();
    let request = String::from_utf8_lossy(&request);
    assert!(request.starts_with("POST /api/logout?user=ada"));
}

#[tokio::test]
async fn test_logout_failure_keeps_session_signed_in() {
    let service = UserDataService::new("http://127.0.0.1:1");
    let mut session = Session::new();
    session.set_user(ada());

    session.logout(&service).await;

    assert!(session.user().is_some());
    assert!(session.can_logout());
}
