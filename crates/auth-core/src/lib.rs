//! webcrud-auth-core - 认证核心库
//!
//! 角色 / 操作 / 权限表，AuthHandler 契约，以及基于 JWT 的默认实现

pub mod action;
pub mod handler;
pub mod permission;
pub mod role;
pub mod token;

pub use action::{Action, ParseActionError, Scope};
pub use handler::{AuthHandler, BearerAuthHandler, Identity};
pub use permission::{PermissionMap, user_can};
pub use role::Role;
pub use token::{Claims, TokenService};

pub use webcrud_common::UserUuid;
