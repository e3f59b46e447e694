//! 注册/登录结果
//!
//! 领域失败以枚举值返回，调用方必须显式处理每一种情况

use serde::Serialize;
use std::fmt;

/// 注册结果
///
/// 校验顺序固定：用户名长度 → 密码长度 → 用户名唯一性，第一个失败项决定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RegisterOutcome {
    /// 用户名长度越界
    InvalidName,
    /// 密码长度越界
    InvalidSecret,
    /// 用户名已被占用
    NameTaken,
    /// 开户成功
    Created,
}

impl RegisterOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RegisterOutcome::Created)
    }
}

impl fmt::Display for RegisterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RegisterOutcome::InvalidName => "invalid name length",
            RegisterOutcome::InvalidSecret => "invalid password length",
            RegisterOutcome::NameTaken => "name already taken",
            RegisterOutcome::Created => "account created",
        };
        f.write_str(text)
    }
}

/// 登录结果
///
/// 优先级固定：用户不存在 → 密码错误 → 已登录 → 成功
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LoginOutcome {
    /// 用户不存在
    UnknownUser,
    /// 密码错误
    BadPassword,
    /// 已处于登录状态
    AlreadyLoggedIn,
    /// 登录成功
    Success,
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success)
    }
}

impl fmt::Display for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LoginOutcome::UnknownUser => "unknown user",
            LoginOutcome::BadPassword => "bad password",
            LoginOutcome::AlreadyLoggedIn => "already logged in",
            LoginOutcome::Success => "login successful",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_terminal_variants_are_success() {
        assert!(RegisterOutcome::Created.is_success());
        assert!(!RegisterOutcome::NameTaken.is_success());
        assert!(!RegisterOutcome::InvalidName.is_success());

        assert!(LoginOutcome::Success.is_success());
        assert!(!LoginOutcome::AlreadyLoggedIn.is_success());
        assert!(!LoginOutcome::BadPassword.is_success());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(RegisterOutcome::NameTaken.to_string(), "name already taken");
        assert_eq!(LoginOutcome::UnknownUser.to_string(), "unknown user");
    }
}
