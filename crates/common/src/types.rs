//! 通用类型定义

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 已认证用户标识
///
/// 由 AuthHandler 产生，原样透传给每个 CRUD 操作。
/// 分发层不校验、不解析其内容。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
#[display("{_0}")]
pub struct UserUuid(String);

impl UserUuid {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 随机生成（v7，按时间有序）
    pub fn generate() -> Self {
        Self::from_uuid(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 尝试按 UUID 解析；标识本身不要求是 UUID
    pub fn to_uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.0).ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for UserUuid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<Uuid> for UserUuid {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl AsRef<str> for UserUuid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
