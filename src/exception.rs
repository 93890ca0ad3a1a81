// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了框架在启动与传输阶段可能出现的异常情况。
//!
//! ## 设计意图
//! - **只覆盖传输层**：请求解析和中间件调度采用宽松降级，不会产生异常。
//! - **语义映射**：每个变体对应一个具体的失败环节，便于上层记录日志或决定是否退出。
//! - **用户友好**：通过实现 `std::fmt::Display`，确保错误信息可以被直接写入日志。

use std::{error, fmt};

/// 框架运行过程中发生的异常类型。
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Exception {
    /// 无法在指定地址和端口上绑定监听套接字。
    BindFailed,
    /// 从连接读取数据失败。
    ReadFailed,
    /// 向连接写出响应报文失败。连接仍会被关闭。
    WriteFailed,
    /// 关闭连接失败。
    CloseFailed,
    /// 连接在空闲超时时间内没有发送任何数据。
    ReadTimeout,
    /// 配置文件不存在或无法读取。
    ConfigUnreadable,
    /// 配置文件内容不是合法的 TOML，或字段类型不匹配。
    ConfigInvalid,
}

use Exception::*;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindFailed => write!(f, "Couldn't bind the listening socket"),
            ReadFailed => write!(f, "Couldn't read from the connection"),
            WriteFailed => write!(f, "Couldn't write the reply to the connection"),
            CloseFailed => write!(f, "Couldn't close the connection"),
            ReadTimeout => write!(f, "Connection idle for too long"),
            ConfigUnreadable => write!(f, "Couldn't read the config file"),
            ConfigInvalid => write!(f, "Config file is not valid TOML"),
        }
    }
}

impl error::Error for Exception {}
