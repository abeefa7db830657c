#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::Request,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use webcrud::{
    Action, AppError, AppResult, AuthHandler, CrudInterface, CrudSettings, ErrorContext,
    ErrorHandler, FailureStage, Identity, PermissionMap, Role, UserUuid, add_crud_handlers,
};

pub const ONE_SLUG: &str = "/api/items/{id}";
pub const ALL_SLUG: &str = "/api/items";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub action: Action,
    pub role: Role,
    pub user: UserUuid,
    pub path: String,
}

/// 记录每次调用的 CrudInterface；`failing` 时每个操作都返回该错误
#[derive(Default)]
pub struct RecordingCrud {
    calls: Mutex<Vec<Call>>,
    failing: Option<fn() -> AppError>,
}

impl RecordingCrud {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(make_error: fn() -> AppError) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            failing: Some(make_error),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, action: Action, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response> {
        self.calls.lock().unwrap().push(Call {
            action,
            role: role.clone(),
            user: user.clone(),
            path: req.uri().path().to_string(),
        });
        match self.failing {
            Some(make_error) => Err(make_error()),
            None => Ok((StatusCode::OK, action.as_str()).into_response()),
        }
    }
}

#[async_trait]
impl CrudInterface for RecordingCrud {
    async fn create_one(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response> {
        self.record(Action::CreateOne, req, role, user)
    }

    async fn create_all(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response> {
        self.record(Action::CreateAll, req, role, user)
    }

    async fn read_one(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response> {
        self.record(Action::ReadOne, req, role, user)
    }

    async fn read_all(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response> {
        self.record(Action::ReadAll, req, role, user)
    }

    async fn update_one(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response> {
        self.record(Action::UpdateOne, req, role, user)
    }

    async fn update_all(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response> {
        self.record(Action::UpdateAll, req, role, user)
    }

    async fn delete_one(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response> {
        self.record(Action::DeleteOne, req, role, user)
    }

    async fn delete_all(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response> {
        self.record(Action::DeleteAll, req, role, user)
    }
}

/// 从 `x-role` / `x-user` 头读取身份，缺失即认证失败
#[derive(Default)]
pub struct HeaderAuth {
    calls: AtomicUsize,
}

impl HeaderAuth {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthHandler for HeaderAuth {
    async fn authenticate(&self, parts: &Parts) -> AppResult<Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        match (header("x-role"), header("x-user")) {
            (Some(role), Some(user)) => Ok(Identity::new(role, user)),
            _ => Err(AppError::unauthenticated("missing identity headers")),
        }
    }
}

/// 记录每次上报的 ErrorHandler
#[derive(Default)]
pub struct RecordingErrors {
    seen: Mutex<Vec<(u16, FailureStage)>>,
}

impl RecordingErrors {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seen(&self) -> Vec<(u16, FailureStage)> {
        self.seen.lock().unwrap().clone()
    }
}

impl ErrorHandler for RecordingErrors {
    fn handle(&self, err: AppError, ctx: &ErrorContext) -> Response {
        let status = err.status_code();
        self.seen.lock().unwrap().push((status.as_u16(), ctx.stage));
        (status, err.to_string()).into_response()
    }
}

pub struct Harness {
    pub app: Router,
    pub crud: Arc<RecordingCrud>,
    pub auth: Arc<HeaderAuth>,
    pub errors: Arc<RecordingErrors>,
}

pub fn harness(permissions: PermissionMap) -> Harness {
    harness_with(permissions, RecordingCrud::new(), CrudSettings::default())
}

pub fn harness_with(
    permissions: PermissionMap,
    crud: Arc<RecordingCrud>,
    settings: CrudSettings,
) -> Harness {
    let auth = HeaderAuth::new();
    let errors = RecordingErrors::new();
    let app = add_crud_handlers(
        Router::new(),
        ONE_SLUG,
        ALL_SLUG,
        permissions,
        crud.clone(),
        auth.clone(),
        errors.clone(),
        Arc::new(settings),
    )
    .expect("register");

    Harness {
        app,
        crud,
        auth,
        errors,
    }
}

pub fn request(method: &str, uri: &str, role: Option<&str>) -> Request {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(role) = role {
        builder = builder.header("x-role", role).header("x-user", "user-1");
    }
    builder.body(Body::empty()).expect("request")
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}
