//! CRUD 操作契约

use async_trait::async_trait;
use axum::{extract::Request, response::Response};
use webcrud_auth_core::{Action, Role};
use webcrud_common::UserUuid;
use webcrud_errors::AppResult;

/// 调用方实现的八个 CRUD 操作
///
/// 每个操作自己读取请求体、访问数据并构造响应（状态码和 body）。
/// 分发层只关心返回的是 `Ok` 还是 `Err`，不解析错误内容。
/// 批量操作（`*_all`）的部分成功语义由实现自行决定。
#[async_trait]
pub trait CrudInterface: Send + Sync {
    async fn create_one(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response>;

    async fn create_all(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response>;

    async fn read_one(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response>;

    async fn read_all(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response>;

    async fn update_one(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response>;

    async fn update_all(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response>;

    async fn delete_one(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response>;

    async fn delete_all(&self, req: Request, role: &Role, user: &UserUuid) -> AppResult<Response>;

    /// 按操作名转发
    async fn call(
        &self,
        action: Action,
        req: Request,
        role: &Role,
        user: &UserUuid,
    ) -> AppResult<Response> {
        match action {
            Action::CreateOne => self.create_one(req, role, user).await,
            Action::CreateAll => self.create_all(req, role, user).await,
            Action::ReadOne => self.read_one(req, role, user).await,
            Action::ReadAll => self.read_all(req, role, user).await,
            Action::UpdateOne => self.update_one(req, role, user).await,
            Action::UpdateAll => self.update_all(req, role, user).await,
            Action::DeleteOne => self.delete_one(req, role, user).await,
            Action::DeleteAll => self.delete_all(req, role, user).await,
        }
    }
}
