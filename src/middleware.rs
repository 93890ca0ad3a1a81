// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 中间件链
//!
//! 中间件按注册顺序依次执行。每个中间件拿到请求、响应以及一个一次性的续体 `Next`，
//! 调用 `next.call(..)` 才会进入下一个中间件；不调用则处理就此停止。
//!
//! 续体以值的方式传入，`call` 会消耗它，因此同一个续体不可能被调用两次。
//! 链走到末尾时续体什么也不做，响应不会被自动最终化，需要某个中间件显式调用
//! `Response::end`。

use crate::{request::Request, response::Response};

use log::{debug, warn};
use std::fmt;

/// 中间件函数
pub type Middleware = Box<dyn Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync>;

/// 有序、只追加的中间件序列。注册完成后在多个连接之间只读共享。
pub struct MiddlewareChain {
    handlers: Vec<Middleware>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// 在链尾追加一个中间件
    pub fn push<F>(&mut self, handler: F)
    where
        F: Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// 让一个已完整接收的请求走一遍中间件链。
    ///
    /// 所有中间件同步执行完毕后返回。返回时响应可能已经最终化，也可能没有。
    pub fn dispatch(&self, request: &mut Request, response: &mut Response) {
        if self.handlers.is_empty() {
            warn!("[ID{}]没有注册任何中间件，请求不会得到响应", request.id());
            return;
        }
        Next {
            chain: self,
            index: 0,
        }
        .call(request, response);
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// 指向链中下一个中间件的一次性续体
pub struct Next<'a> {
    chain: &'a MiddlewareChain,
    index: usize,
}

impl<'a> Next<'a> {
    /// 进入下一个中间件。
    ///
    /// 链已耗尽或响应已经最终化时什么也不做。
    pub fn call(self, request: &mut Request, response: &mut Response) {
        if response.is_finished() {
            debug!(
                "[ID{}]响应已最终化，跳过第{}个及之后的中间件",
                request.id(),
                self.index
            );
            return;
        }
        match self.chain.handlers.get(self.index) {
            Some(handler) => {
                debug!(
                    "[ID{}]调用中间件: {} 总数: {}",
                    request.id(),
                    self.index,
                    self.chain.len()
                );
                let next = Next {
                    chain: self.chain,
                    index: self.index + 1,
                };
                handler(request, response, next);
            }
            None => debug!("[ID{}]中间件链已耗尽", request.id()),
        }
    }

    /// 该续体将要调用的中间件下标
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("len", &self.chain.len())
            .finish()
    }
}
