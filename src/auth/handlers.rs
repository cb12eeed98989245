use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest},
        middleware::{require_auth, AuthUser},
    },
    error::ApiResult,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn profile_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/profile", get(profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let session = state.auth.register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            token: session.token,
            user: session.user,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(payload) = payload?;
    let session = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(AuthResponse {
        message: "Login successful",
        token: session.token,
        user: session.user,
    }))
}

#[instrument(skip_all)]
pub async fn profile(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state.auth.profile(caller.user_id).await?;
    Ok(Json(ProfileResponse { user }))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request},
        response::Response,
    };
    use serde_json::{json, Value};
    use time::{Duration, OffsetDateTime};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{app::build_app, auth::claims::Identity, state::AppState};

    async fn send(app: &axum::Router, req: Request<Body>) -> (axum::http::StatusCode, Value) {
        let res: Response = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_profile(auth: Option<&str>) -> Request<Body> {
        let mut b = Request::builder().method("GET").uri("/api/auth/profile");
        if let Some(auth) = auth {
            b = b.header(header::AUTHORIZATION, auth);
        }
        b.body(Body::empty()).unwrap()
    }

    fn alice() -> Value {
        json!({"name": "Alice", "email": "a@x.com", "password": "secret123"})
    }

    #[tokio::test]
    async fn register_login_and_profile_flow() {
        let state = AppState::fake();
        let app = build_app(state);

        let (status, reg) = send(&app, post_json("/api/auth/register", alice())).await;
        assert_eq!(status, 201);
        assert_eq!(reg["message"], "User registered successfully");
        assert_eq!(reg["user"]["email"], "a@x.com");
        assert_eq!(reg["user"]["userType"], "both");
        assert!(reg["user"].get("password").is_none());
        assert!(reg["user"].get("passwordHash").is_none());
        assert!(reg["token"].as_str().unwrap().len() > 20);

        let (status, login) = send(
            &app,
            post_json("/api/auth/login", json!({"email": "a@x.com", "password": "secret123"})),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(login["message"], "Login successful");
        assert_eq!(login["user"]["id"], reg["user"]["id"]);

        let bearer = format!("Bearer {}", login["token"].as_str().unwrap());
        let (status, me) = send(&app, get_profile(Some(&bearer))).await;
        assert_eq!(status, 200);
        assert_eq!(me["user"]["id"], reg["user"]["id"]);
        assert_eq!(me["user"]["name"], "Alice");

        let (status, bad) = send(
            &app,
            post_json("/api/auth/login", json!({"email": "a@x.com", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, 401);
        assert_eq!(bad["error"], "Invalid email or password");
    }

    #[tokio::test]
    async fn register_rejects_missing_fields_and_duplicates() {
        let app = build_app(AppState::fake());

        let (status, body) = send(
            &app,
            post_json("/api/auth/register", json!({"email": "a@x.com", "password": "pw"})),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "name is required");

        let (status, _) = send(&app, post_json("/api/auth/register", alice())).await;
        assert_eq!(status, 201);
        let (status, body) = send(&app, post_json("/api/auth/register", alice())).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "User already exists with this email");
    }

    #[tokio::test]
    async fn register_stores_profile_fields() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/register",
                json!({
                    "name": "Bob",
                    "email": "bob@trade.in",
                    "password": "pw123456",
                    "phone": "+91 555",
                    "company": "Bob Exports",
                    "exportNumber": "IEC-77",
                    "userType": "exporter"
                }),
            ),
        )
        .await;
        assert_eq!(status, 201);
        assert_eq!(body["user"]["company"], "Bob Exports");
        assert_eq!(body["user"]["exportNumber"], "IEC-77");
        assert_eq!(body["user"]["importNumber"], "");
        assert_eq!(body["user"]["userType"], "exporter");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 400);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn login_with_missing_fields_is_bad_request() {
        let app = build_app(AppState::fake());
        let (status, body) =
            send(&app, post_json("/api/auth/login", json!({"email": "a@x.com"}))).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "password is required");
    }

    #[tokio::test]
    async fn profile_rejects_missing_and_invalid_tokens() {
        let state = AppState::fake();
        let app = build_app(state.clone());

        let (status, body) = send(&app, get_profile(None)).await;
        assert_eq!(status, 401);
        assert_eq!(body["error"], "Access token required");

        let (status, body) = send(&app, get_profile(Some("Bearer garbage"))).await;
        assert_eq!(status, 403);
        assert_eq!(body["error"], "Invalid or expired token");

        let ghost = Identity {
            user_id: Uuid::new_v4(),
            email: "a@x.com".into(),
            name: "Alice".into(),
        };
        let stale = state
            .auth
            .tokens()
            .issue_at(&ghost, OffsetDateTime::now_utc() - Duration::hours(24))
            .unwrap();
        let (status, body) = send(&app, get_profile(Some(&format!("Bearer {}", stale)))).await;
        assert_eq!(status, 403);
        assert_eq!(body["error"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn profile_for_unknown_user_is_not_found() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let token = state
            .auth
            .tokens()
            .issue(&Identity {
                user_id: Uuid::new_v4(),
                email: "gone@x.com".into(),
                name: "Gone".into(),
            })
            .unwrap();
        let (status, body) = send(&app, get_profile(Some(&format!("Bearer {}", token)))).await;
        assert_eq!(status, 404);
        assert_eq!(body["error"], "User not found");
    }
}
