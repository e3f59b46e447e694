//! 工具模块

/// 配置管理
pub mod config;
