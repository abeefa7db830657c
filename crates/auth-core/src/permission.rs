//! 权限表

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Action, Role};

/// 角色名 -> 允许的操作名列表
///
/// 每次路由注册时由调用方提供，分发期间只读。
/// 没有通配符、没有角色继承：每个角色的权限都必须显式列出。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMap(HashMap<String, Vec<String>>);

impl PermissionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加授权；同一角色多次调用会按顺序累加
    pub fn grant(mut self, role: impl Into<Role>, actions: impl IntoIterator<Item = Action>) -> Self {
        let role = role.into();
        self.0
            .entry(role.as_str().to_string())
            .or_default()
            .extend(actions.into_iter().map(|a| a.as_str().to_string()));
        self
    }

    /// 以原始字符串授权，未知的操作名原样保留但永远不会命中
    pub fn grant_names<I, S>(mut self, role: impl Into<Role>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let role = role.into();
        self.0
            .entry(role.as_str().to_string())
            .or_default()
            .extend(actions.into_iter().map(Into::into));
        self
    }

    /// 精确匹配角色名，再线性扫描该角色的操作列表
    pub fn allows(&self, role: &Role, action: Action) -> bool {
        self.0
            .get(role.as_str())
            .is_some_and(|actions| actions.iter().any(|a| a == action.as_str()))
    }

    pub fn actions_for(&self, role: &Role) -> &[String] {
        self.0.get(role.as_str()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, Vec<String>>> for PermissionMap {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

impl<R, A> FromIterator<(R, A)> for PermissionMap
where
    R: Into<Role>,
    A: IntoIterator<Item = Action>,
{
    fn from_iter<T: IntoIterator<Item = (R, A)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::new(), |map, (role, actions)| map.grant(role, actions))
    }
}

/// 角色 `role` 是否被允许执行 `action`
pub fn user_can(permissions: &PermissionMap, role: &Role, action: Action) -> bool {
    permissions.allows(role, action)
}
