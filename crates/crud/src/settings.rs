//! 进程级 CRUD 设置
//!
//! 启动时构造一次，通过 `Arc` 共享给所有路由注册，之后只读。

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;
use webcrud_config::CrudConfig;

/// 分发层接受的 HTTP 方法
pub const ALLOWED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

/// 方法不在 GET/POST/PUT/DELETE 之内时调用
pub trait NotAllowedHandler: Send + Sync {
    fn not_allowed(&self, method: &Method, uri: &Uri) -> Response;
}

impl<F> NotAllowedHandler for F
where
    F: Fn(&Method, &Uri) -> Response + Send + Sync,
{
    fn not_allowed(&self, method: &Method, uri: &Uri) -> Response {
        self(method, uri)
    }
}

/// 默认实现：405 + `Allow` 头
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodNotAllowed;

impl NotAllowedHandler for MethodNotAllowed {
    fn not_allowed(&self, _method: &Method, _uri: &Uri) -> Response {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, POST, PUT, DELETE")],
        )
            .into_response()
    }
}

/// 权限不足时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeniedPolicy {
    /// 不调用任何操作，也不上报错误，返回空的 200
    #[default]
    Silent,
    /// 以 `AppError::Forbidden` 调用 ErrorHandler
    Forbidden,
}

#[derive(Clone)]
pub struct CrudSettings {
    pub not_allowed: Arc<dyn NotAllowedHandler>,
    /// 仅用于构造 CORS layer，分发逻辑本身不检查 Origin
    pub allowed_origins: Vec<String>,
    pub denied_policy: DeniedPolicy,
}

impl Default for CrudSettings {
    fn default() -> Self {
        Self::new(Arc::new(MethodNotAllowed))
    }
}

impl CrudSettings {
    pub fn new(not_allowed: Arc<dyn NotAllowedHandler>) -> Self {
        Self {
            not_allowed,
            allowed_origins: Vec::new(),
            denied_policy: DeniedPolicy::default(),
        }
    }

    pub fn from_config(config: &CrudConfig) -> Self {
        Self::default()
            .with_allowed_origins(config.allowed_origins.clone())
            .with_denied_policy(if config.deny_with_forbidden {
                DeniedPolicy::Forbidden
            } else {
                DeniedPolicy::Silent
            })
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    pub fn with_denied_policy(mut self, policy: DeniedPolicy) -> Self {
        self.denied_policy = policy;
        self
    }

    /// 按允许的源构造 CORS layer；未配置源或含 `*` 时放开
    pub fn cors_layer(&self) -> CorsLayer {
        if self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*") {
            return CorsLayer::permissive();
        }

        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(ALLOWED_METHODS.to_vec())
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
    }
}
