//! 路由注册与请求分发
//!
//! 每个请求的处理流程：
//! 1. 方法不在 GET/POST/PUT/DELETE 之内 -> NotAllowedHandler
//! 2. AuthHandler 认证失败 -> ErrorHandler
//! 3. 方法映射为操作并查权限表；无权限时按 [`DeniedPolicy`] 处理
//! 4. 调用对应的 CRUD 操作一次；失败 -> ErrorHandler

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
};
use thiserror::Error;
use tracing::{Instrument, debug, error, info_span, warn};
use webcrud_auth_core::{Action, AuthHandler, PermissionMap, Scope};
use webcrud_errors::AppError;

use crate::{
    CrudInterface, CrudSettings, DeniedPolicy, ErrorContext, ErrorHandler, FailureStage,
    ProblemJsonErrorHandler,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("single-item slug must not be empty")]
    EmptySlug,

    #[error("slug `{0}` is not a valid route path")]
    InvalidSlug(String),

    #[error("slug `{0}` is used for both single-item and bulk routes")]
    DuplicateSlug(String),
}

/// 一次路由注册持有的全部协作方，注册后只读
struct Registration {
    one_slug: String,
    all_slug: String,
    permissions: PermissionMap,
    crud: Arc<dyn CrudInterface>,
    auth: Arc<dyn AuthHandler>,
    error_handler: Arc<dyn ErrorHandler>,
    settings: Arc<CrudSettings>,
}

fn record(action: &'static str, outcome: &'static str) {
    metrics::counter!("webcrud_requests_total", "action" => action, "outcome" => outcome)
        .increment(1);
}

impl Registration {
    fn slug(&self, scope: Scope) -> &str {
        match scope {
            Scope::One => &self.one_slug,
            Scope::All => &self.all_slug,
        }
    }

    async fn dispatch(&self, scope: Scope, req: Request) -> Response {
        let Some(action) = Action::for_method(req.method(), scope) else {
            debug!(
                slug = self.slug(scope),
                scope = scope.as_str(),
                method = %req.method(),
                "Method not allowed"
            );
            record("none", "not_allowed");
            return self.settings.not_allowed.not_allowed(req.method(), req.uri());
        };

        let span = info_span!(
            "crud.dispatch",
            slug = self.slug(scope),
            scope = scope.as_str(),
            method = %req.method(),
            action = action.as_str()
        );
        self.handle(action, req).instrument(span).await
    }

    async fn handle(&self, action: Action, req: Request) -> Response {
        let (parts, body) = req.into_parts();

        let identity = match self.auth.authenticate(&parts).await {
            Ok(identity) => identity,
            Err(err) => {
                warn!(error = %err, "Authentication failed");
                record(action.as_str(), "unauthenticated");
                let ctx = ErrorContext::new(&parts, FailureStage::Authentication);
                return self.error_handler.handle(err, &ctx);
            }
        };

        if !self.permissions.allows(&identity.role, action) {
            record(action.as_str(), "denied");
            return match self.settings.denied_policy {
                DeniedPolicy::Silent => {
                    debug!(role = %identity.role, "Permission denied, no operation invoked");
                    StatusCode::OK.into_response()
                }
                DeniedPolicy::Forbidden => {
                    debug!(role = %identity.role, "Permission denied");
                    let err = AppError::forbidden(format!(
                        "role {} may not {}",
                        identity.role, action
                    ));
                    let ctx = ErrorContext::new(&parts, FailureStage::Permission(action));
                    self.error_handler.handle(err, &ctx)
                }
            };
        }

        let ctx = ErrorContext::new(&parts, FailureStage::Operation(action));
        let req = Request::from_parts(parts, body);

        match self
            .crud
            .call(action, req, &identity.role, &identity.user)
            .await
        {
            Ok(response) => {
                record(action.as_str(), "ok");
                response
            }
            Err(err) => {
                if err.is_server_error() {
                    error!(error = %err, user = %identity.user, "Operation failed");
                } else {
                    warn!(error = %err, user = %identity.user, "Operation rejected");
                }
                record(action.as_str(), "failed");
                self.error_handler.handle(err, &ctx)
            }
        }
    }
}

/// 路径片段是否符合 axum 0.8 的路由语法
///
/// 每段至多一个 `{name}` 参数；`{*name}` 只能出现在最后一段；
/// 旧语法 `:name` / `*name` 不被接受。
fn is_valid_segment(segment: &str, last: bool) -> bool {
    if segment.starts_with(':') || segment.starts_with('*') {
        return false;
    }

    let mut params = 0;
    let mut open = false;
    let mut wildcard = false;
    let mut name_len = 0;
    for c in segment.chars() {
        match c {
            '{' if open => return false,
            '{' => {
                open = true;
                wildcard = false;
                name_len = 0;
                params += 1;
            }
            '}' if !open => return false,
            '}' => {
                if name_len == 0 || (wildcard && !last) {
                    return false;
                }
                open = false;
            }
            '*' if open && name_len == 0 && !wildcard => wildcard = true,
            _ if open => name_len += 1,
            _ => {}
        }
    }
    !open && params <= 1
}

fn is_valid_slug(slug: &str) -> bool {
    let Some(rest) = slug.strip_prefix('/') else {
        return false;
    };
    let segments: Vec<&str> = rest.split('/').collect();
    let last = segments.len() - 1;
    segments
        .iter()
        .enumerate()
        .all(|(i, segment)| is_valid_segment(segment, i == last))
}

fn validate_slugs(one_slug: &str, all_slug: &str) -> Result<(), RegistrationError> {
    if one_slug.is_empty() {
        return Err(RegistrationError::EmptySlug);
    }
    for slug in [one_slug, all_slug] {
        if !slug.is_empty() && !is_valid_slug(slug) {
            return Err(RegistrationError::InvalidSlug(slug.to_string()));
        }
    }
    if one_slug == all_slug {
        return Err(RegistrationError::DuplicateSlug(one_slug.to_string()));
    }
    Ok(())
}

/// 在 `router` 上注册单条路由 `one_slug` 和批量路由 `all_slug`
///
/// `all_slug` 为空时只注册单条路由。slug 语法错误返回 [`RegistrationError`]；
/// 与 `router` 上已有路由冲突时仍由 axum panic，各资源需使用互不重叠的 slug。
#[allow(clippy::too_many_arguments)]
pub fn add_crud_handlers<S>(
    router: Router<S>,
    one_slug: &str,
    all_slug: &str,
    permissions: PermissionMap,
    crud: Arc<dyn CrudInterface>,
    auth: Arc<dyn AuthHandler>,
    error_handler: Arc<dyn ErrorHandler>,
    settings: Arc<CrudSettings>,
) -> Result<Router<S>, RegistrationError>
where
    S: Clone + Send + Sync + 'static,
{
    validate_slugs(one_slug, all_slug)?;

    let registration = Arc::new(Registration {
        one_slug: one_slug.to_string(),
        all_slug: all_slug.to_string(),
        permissions,
        crud,
        auth,
        error_handler,
        settings,
    });

    let one = Arc::clone(&registration);
    let mut router = router.route(
        one_slug,
        any(move |req: Request| {
            let registration = Arc::clone(&one);
            async move { registration.dispatch(Scope::One, req).await }
        }),
    );

    if !all_slug.is_empty() {
        router = router.route(
            all_slug,
            any(move |req: Request| {
                let registration = Arc::clone(&registration);
                async move { registration.dispatch(Scope::All, req).await }
            }),
        );
    }

    debug!(one_slug, all_slug, "CRUD handlers registered");
    Ok(router)
}

/// [`add_crud_handlers`] 的 builder 形式
///
/// 默认：空权限表、[`ProblemJsonErrorHandler`]、[`CrudSettings::default`]。
pub struct CrudRoutes {
    one_slug: String,
    all_slug: String,
    permissions: PermissionMap,
    crud: Arc<dyn CrudInterface>,
    auth: Arc<dyn AuthHandler>,
    error_handler: Arc<dyn ErrorHandler>,
    settings: Arc<CrudSettings>,
}

impl CrudRoutes {
    pub fn new(
        one_slug: impl Into<String>,
        all_slug: impl Into<String>,
        crud: Arc<dyn CrudInterface>,
        auth: Arc<dyn AuthHandler>,
    ) -> Self {
        Self {
            one_slug: one_slug.into(),
            all_slug: all_slug.into(),
            permissions: PermissionMap::new(),
            crud,
            auth,
            error_handler: Arc::new(ProblemJsonErrorHandler),
            settings: Arc::new(CrudSettings::default()),
        }
    }

    pub fn permissions(mut self, permissions: PermissionMap) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn error_handler(mut self, error_handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = error_handler;
        self
    }

    pub fn settings(mut self, settings: Arc<CrudSettings>) -> Self {
        self.settings = settings;
        self
    }

    pub fn register<S>(self, router: Router<S>) -> Result<Router<S>, RegistrationError>
    where
        S: Clone + Send + Sync + 'static,
    {
        add_crud_handlers(
            router,
            &self.one_slug,
            &self.all_slug,
            self.permissions,
            self.crud,
            self.auth,
            self.error_handler,
            self.settings,
        )
    }
}
