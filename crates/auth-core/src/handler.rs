//! AuthHandler 契约

use async_trait::async_trait;
use http::{header, request::Parts};
use tracing::{debug, warn};
use webcrud_common::UserUuid;
use webcrud_errors::{AppError, AppResult};

use crate::{Role, TokenService};

/// 认证结果：角色 + 用户标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub role: Role,
    pub user: UserUuid,
}

impl Identity {
    pub fn new(role: impl Into<Role>, user: impl Into<UserUuid>) -> Self {
        Self {
            role: role.into(),
            user: user.into(),
        }
    }
}

/// 认证一次请求，解析出角色和用户标识
///
/// 只拿到请求头部分（method / uri / headers / extensions），body 留给 CRUD 操作。
/// 失败时由分发层交给 ErrorHandler，自身不写响应。
#[async_trait]
pub trait AuthHandler: Send + Sync {
    async fn authenticate(&self, parts: &Parts) -> AppResult<Identity>;
}

#[async_trait]
impl<F> AuthHandler for F
where
    F: Fn(&Parts) -> AppResult<Identity> + Send + Sync,
{
    async fn authenticate(&self, parts: &Parts) -> AppResult<Identity> {
        self(parts)
    }
}

/// `Authorization: Bearer <jwt>` 认证
///
/// 角色取 `roles` claim 的第一个值，用户标识取 `sub`。
#[derive(Clone)]
pub struct BearerAuthHandler {
    tokens: TokenService,
}

impl BearerAuthHandler {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }

    fn bearer_token(parts: &Parts) -> AppResult<&str> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::unauthenticated("Missing authorization header"))?
            .to_str()
            .map_err(|_| AppError::unauthenticated("Malformed authorization header"))?;

        header
            .strip_prefix("Bearer ")
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthenticated("Expected a bearer token"))
    }
}

#[async_trait]
impl AuthHandler for BearerAuthHandler {
    async fn authenticate(&self, parts: &Parts) -> AppResult<Identity> {
        let token = Self::bearer_token(parts)?;
        debug!("Validating JWT token");

        let claims = self.tokens.validate_access_token(token).inspect_err(|e| {
            warn!(error = %e, "Token validation failed");
        })?;

        let role = claims
            .roles
            .first()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Token carries no role"))?;

        debug!(user = %claims.sub, role = %role, "Token validated successfully");
        Ok(Identity::new(role, claims.user()))
    }
}
