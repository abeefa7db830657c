//! CRUD 操作标识

use std::fmt;
use std::str::FromStr;

use http::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 未知操作名
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action: {0}")]
pub struct ParseActionError(pub String);

/// 路由作用域：单条 (`One`) 或批量 (`All`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    One,
    All,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::One => "one",
            Self::All => "all",
        }
    }
}

/// 八个静态操作名，与权限表中的字符串一一对应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    CreateOne,
    CreateAll,
    ReadOne,
    ReadAll,
    UpdateOne,
    UpdateAll,
    DeleteOne,
    DeleteAll,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::CreateOne,
        Action::CreateAll,
        Action::ReadOne,
        Action::ReadAll,
        Action::UpdateOne,
        Action::UpdateAll,
        Action::DeleteOne,
        Action::DeleteAll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateOne => "CreateOne",
            Self::CreateAll => "CreateAll",
            Self::ReadOne => "ReadOne",
            Self::ReadAll => "ReadAll",
            Self::UpdateOne => "UpdateOne",
            Self::UpdateAll => "UpdateAll",
            Self::DeleteOne => "DeleteOne",
            Self::DeleteAll => "DeleteAll",
        }
    }

    /// HTTP 方法 -> 操作
    ///
    /// GET/POST/PUT/DELETE 之外的方法返回 `None`
    pub fn for_method(method: &Method, scope: Scope) -> Option<Self> {
        let action = match (method, scope) {
            (&Method::GET, Scope::One) => Self::ReadOne,
            (&Method::POST, Scope::One) => Self::CreateOne,
            (&Method::PUT, Scope::One) => Self::UpdateOne,
            (&Method::DELETE, Scope::One) => Self::DeleteOne,
            (&Method::GET, Scope::All) => Self::ReadAll,
            (&Method::POST, Scope::All) => Self::CreateAll,
            (&Method::PUT, Scope::All) => Self::UpdateAll,
            (&Method::DELETE, Scope::All) => Self::DeleteAll,
            _ => return None,
        };
        Some(action)
    }

    pub fn scope(&self) -> Scope {
        match self {
            Self::CreateOne | Self::ReadOne | Self::UpdateOne | Self::DeleteOne => Scope::One,
            _ => Scope::All,
        }
    }

    pub fn is_bulk(&self) -> bool {
        self.scope() == Scope::All
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ParseActionError(s.to_string()))
    }
}
