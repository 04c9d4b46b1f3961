use askama::Template;
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use cookie::Cookie;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::state::AppState;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate;

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

#[derive(Deserialize, Serialize)]
struct AuthResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Deserialize)]
struct AuthServiceResponse {
    #[serde(rename = "success")]
    _success: bool,
    data: AuthResponse,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    message: String,
}

pub async fn login_page() -> Html<String> {
    let template = LoginTemplate;
    Html(template.render().unwrap())
}

/// Credentials go to the external auth service; we only keep its tokens
/// as cookies.
pub async fn login_handler(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, Html<String>> {
    let client = reqwest::Client::new();
    let login_url = format!("{}/api/v1/auth/login", state.config.auth_api_url);

    let response = client
        .post(&login_url)
        .json(&json!({
            "email": form.email,
            "password": form.password,
        }))
        .send()
        .await;

    match response {
        Ok(resp) => {
            let status = resp.status();
            if !status.is_success() {
                error!("Auth service error: {}", status);
                let template = ErrorTemplate {
                    message: format!("Login failed: {}", status),
                };
                return Err(Html(template.render().unwrap()));
            }

            let body_text = resp.text().await.unwrap_or_default();
            let auth_resp = match serde_json::from_str::<AuthServiceResponse>(&body_text) {
                Ok(wrapper) => wrapper.data,
                Err(e) => {
                    error!("Could not parse auth response: {}", e);
                    let template = ErrorTemplate {
                        message: format!("Parse error: {}", e),
                    };
                    return Err(Html(template.render().unwrap()));
                }
            };

            let mut access_cookie = Cookie::new("access_token", auth_resp.access_token.clone());
            access_cookie.set_path("/");
            access_cookie.set_http_only(true);
            access_cookie.set_same_site(cookie::SameSite::Lax);

            let mut refresh_cookie = Cookie::new("refresh_token", auth_resp.refresh_token);
            refresh_cookie.set_path("/");
            refresh_cookie.set_http_only(true);
            refresh_cookie.set_same_site(cookie::SameSite::Lax);

            let mut response = Redirect::to("/activities").into_response();
            response.headers_mut().append(
                header::SET_COOKIE,
                access_cookie.to_string().parse().unwrap(),
            );
            response.headers_mut().append(
                header::SET_COOKIE,
                refresh_cookie.to_string().parse().unwrap(),
            );

            Ok(response)
        }
        Err(e) => {
            error!("Request to auth service failed: {}", e);
            let template = ErrorTemplate {
                message: format!("Connection error: {}", e),
            };
            Err(Html(template.render().unwrap()))
        }
    }
}

pub async fn logout_handler() -> Response {
    // Clear cookies
    let mut access_cookie = Cookie::new("access_token", "");
    access_cookie.set_path("/");
    access_cookie.set_http_only(true);
    access_cookie.set_same_site(cookie::SameSite::Lax);
    access_cookie.set_max_age(None);

    let mut refresh_cookie = Cookie::new("refresh_token", "");
    refresh_cookie.set_path("/");
    refresh_cookie.set_http_only(true);
    refresh_cookie.set_same_site(cookie::SameSite::Lax);
    refresh_cookie.set_max_age(None);

    let mut response = Redirect::to("/login").into_response();
    response.headers_mut().append(
        header::SET_COOKIE,
        access_cookie.to_string().parse().unwrap(),
    );
    response.headers_mut().append(
        header::SET_COOKIE,
        refresh_cookie.to_string().parse().unwrap(),
    );

    response
}
