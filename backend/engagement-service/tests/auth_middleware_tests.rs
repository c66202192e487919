use actix_web::{http::StatusCode, test, web, App, HttpResponse};
/// Tests for the JWT bearer middleware and identity extraction
use engagement_service::middleware::{AuthenticatedUser, Claims, JwtAuth};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

const SECRET: &str = "test-secret";

fn token_for(user_id: Uuid, is_admin: bool, secret: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        is_admin,
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

async fn whoami(auth: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "user_id": auth.user_id,
        "is_admin": auth.is_admin,
    }))
}

macro_rules! test_app {
    () => {
        test::init_service(
            App::new().service(
                web::scope("/api/v1")
                    .wrap(JwtAuth::new(SECRET))
                    .route("/whoami", web::get().to(whoami)),
            ),
        )
        .await
    };
}

/// Middleware rejections may surface either as an error response or as a
/// service-level error; both must map to 401.
macro_rules! assert_unauthorized {
    ($app:expr, $req:expr) => {
        match test::try_call_service(&$app, $req).await {
            Ok(resp) => assert_eq!(resp.status(), StatusCode::UNAUTHORIZED),
            Err(err) => assert_eq!(
                err.as_response_error().status_code(),
                StatusCode::UNAUTHORIZED
            ),
        }
    };
}

#[actix_web::test]
async fn test_valid_token_resolves_identity() {
    let app = test_app!();
    let user_id = Uuid::new_v4();

    let req = test::TestRequest::get()
        .uri("/api/v1/whoami")
        .insert_header((
            "Authorization",
            format!("Bearer {}", token_for(user_id, false, SECRET)),
        ))
        .to_request();

    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["user_id"], user_id.to_string());
    assert_eq!(body["is_admin"], false);
}

#[actix_web::test]
async fn test_admin_claim_is_honored() {
    let app = test_app!();
    let user_id = Uuid::new_v4();

    let req = test::TestRequest::get()
        .uri("/api/v1/whoami")
        .insert_header((
            "Authorization",
            format!("Bearer {}", token_for(user_id, true, SECRET)),
        ))
        .to_request();

    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["is_admin"], true);
}

#[actix_web::test]
async fn test_missing_header_is_unauthorized() {
    let app = test_app!();

    let req = test::TestRequest::get().uri("/api/v1/whoami").to_request();
    assert_unauthorized!(app, req);
}

#[actix_web::test]
async fn test_non_bearer_scheme_is_unauthorized() {
    let app = test_app!();

    let req = test::TestRequest::get()
        .uri("/api/v1/whoami")
        .insert_header(("Authorization", "Basic abc123"))
        .to_request();
    assert_unauthorized!(app, req);
}

#[actix_web::test]
async fn test_wrong_secret_is_unauthorized() {
    let app = test_app!();
    let user_id = Uuid::new_v4();

    let req = test::TestRequest::get()
        .uri("/api/v1/whoami")
        .insert_header((
            "Authorization",
            format!("Bearer {}", token_for(user_id, false, "other-secret")),
        ))
        .to_request();
    assert_unauthorized!(app, req);
}

#[actix_web::test]
async fn test_garbage_token_is_unauthorized() {
    let app = test_app!();

    let req = test::TestRequest::get()
        .uri("/api/v1/whoami")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    assert_unauthorized!(app, req);
}
