//! 开发环境令牌签发
//!
//! 仅在 `app_env = "development"` 时挂载，方便本地调试 CRUD 路由。

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use webcrud::{AppResult, UserUuid};
use webcrud_auth_core::TokenService;

pub fn auth_routes(tokens: TokenService) -> Router {
    Router::new()
        .route("/api/auth/token", post(issue_token))
        .with_state(tokens)
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub role: String,
    /// 不传则随机生成
    pub user: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub user: String,
    pub expires_in: i64,
    pub token_type: String,
}

async fn issue_token(
    State(tokens): State<TokenService>,
    Json(req): Json<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let user = req.user.map(UserUuid::new).unwrap_or_else(UserUuid::generate);
    let access_token = tokens.generate_access_token(&user, vec![req.role])?;

    Ok(Json(TokenResponse {
        access_token,
        user: user.to_string(),
        expires_in: tokens.access_token_expires_in(),
        token_type: "Bearer".to_string(),
    }))
}
