//! 错误上报钩子

use axum::{
    http::{Method, Uri, request::Parts},
    response::{IntoResponse, Response},
};
use webcrud_auth_core::Action;
use webcrud_errors::AppError;

/// 失败发生的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Authentication,
    /// 仅在 [`DeniedPolicy::Forbidden`](crate::DeniedPolicy::Forbidden) 下出现
    Permission(Action),
    Operation(Action),
}

/// 交给 ErrorHandler 的请求上下文
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub method: Method,
    pub uri: Uri,
    pub stage: FailureStage,
}

impl ErrorContext {
    pub fn new(parts: &Parts, stage: FailureStage) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            stage,
        }
    }
}

/// 认证失败、操作失败时调用，每次失败恰好一次
#[cfg_attr(test, mockall::automock)]
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, err: AppError, ctx: &ErrorContext) -> Response;
}

impl<F> ErrorHandler for F
where
    F: Fn(AppError, &ErrorContext) -> Response + Send + Sync,
{
    fn handle(&self, err: AppError, ctx: &ErrorContext) -> Response {
        self(err, ctx)
    }
}

/// 默认实现：RFC 7807 problem+json，`instance` 为请求路径
#[derive(Debug, Clone, Copy, Default)]
pub struct ProblemJsonErrorHandler;

impl ErrorHandler for ProblemJsonErrorHandler {
    fn handle(&self, err: AppError, ctx: &ErrorContext) -> Response {
        err.to_problem_details()
            .with_instance(ctx.uri.path())
            .into_response()
    }
}
