//! 角色

use std::borrow::Cow;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{Action, PermissionMap};

/// 用户角色
///
/// 调用方自定义的访问类别，按值比较。`Admin` 与 `User` 为内置示例。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(transparent)]
#[display("{_0}")]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("Admin"));
    pub const USER: Role = Role(Cow::Borrowed("User"));

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 在权限表中查找该角色是否允许执行 `action`
    pub fn can(&self, permissions: &PermissionMap, action: Action) -> bool {
        permissions.allows(self, action)
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
