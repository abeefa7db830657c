//! webcrud - 基于角色的 CRUD 路由注册
//!
//! 把 HTTP 方法映射到八个 CRUD 操作，查权限表，再转发给调用方实现的
//! [`CrudInterface`]。数据访问、响应内容都由调用方决定。
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use axum::Router;
//! use webcrud::{Action, CrudSettings, PermissionMap, ProblemJsonErrorHandler, Role, add_crud_handlers};
//! # fn wire(crud: Arc<dyn webcrud::CrudInterface>, auth: Arc<dyn webcrud::AuthHandler>) {
//! let permissions = PermissionMap::new()
//!     .grant(Role::ADMIN, Action::ALL)
//!     .grant(Role::USER, [Action::ReadOne, Action::ReadAll]);
//!
//! let app: Router = add_crud_handlers(
//!     Router::new(),
//!     "/api/notes/{id}",
//!     "/api/notes",
//!     permissions,
//!     crud,
//!     auth,
//!     Arc::new(ProblemJsonErrorHandler),
//!     Arc::new(CrudSettings::default()),
//! )
//! .expect("valid slugs");
//! # }
//! ```

pub mod dispatcher;
pub mod error_handler;
pub mod interface;
pub mod settings;

pub use dispatcher::{CrudRoutes, RegistrationError, add_crud_handlers};
pub use error_handler::{ErrorContext, ErrorHandler, FailureStage, ProblemJsonErrorHandler};
pub use interface::CrudInterface;
pub use settings::{CrudSettings, DeniedPolicy, MethodNotAllowed, NotAllowedHandler};

pub use webcrud_auth_core::{Action, AuthHandler, Identity, PermissionMap, Role, Scope, UserUuid};
pub use webcrud_errors::{AppError, AppResult};
