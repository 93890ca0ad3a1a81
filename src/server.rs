// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 应用与监听循环
//!
//! `Recurse` 是框架的入口：先用 `use_middleware` 按顺序注册中间件，再调用 `listen`
//! （或 `bind` + `Server::run`）开始接受连接。注册完成后中间件链通过 `Arc` 在所有连接任务之间只读共享。

use crate::{
    config::Config,
    connection::handle_connection,
    exception::Exception,
    middleware::{MiddlewareChain, Next},
    request::Request,
    response::Response,
};

use log::{debug, error, info, warn};
use std::{
    future::{self, Future},
    net::{IpAddr, SocketAddr},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tokio::net::TcpListener;

/// 框架应用对象
#[derive(Debug)]
pub struct Recurse {
    chain: MiddlewareChain,
    config: Config,
}

impl Recurse {
    pub fn new() -> Self {
        Self::with_config(Config::new())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            chain: MiddlewareChain::new(),
            config,
        }
    }

    /// 注册一个中间件。注册顺序即执行顺序，应在开始监听之前完成。
    pub fn use_middleware<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync + 'static,
    {
        self.chain.push(handler);
        self
    }

    /// 最终化响应，可在任何中间件中调用。
    ///
    /// 等价于 `response.end(request)`。
    pub fn end(request: &Request, response: &mut Response) {
        response.end(request);
    }

    pub fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 绑定监听套接字
    pub async fn bind(self, addr: SocketAddr) -> Result<Server, Exception> {
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("无法绑定地址：{}，错误：{}", addr, e);
                return Err(Exception::BindFailed);
            }
        };
        info!("地址{}绑定完成，已注册{}个中间件", addr, self.chain.len());
        Ok(Server {
            listener,
            app: Arc::new(self),
            active_connection: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// 在给定地址和端口上监听并持续处理连接。
    ///
    /// 绑定失败时立即返回 `Exception::BindFailed`。
    pub async fn listen(self, port: u16, address: IpAddr) -> Result<(), Exception> {
        self.bind(SocketAddr::new(address, port)).await?.run().await
    }
}

impl Default for Recurse {
    fn default() -> Self {
        Self::new()
    }
}

/// 已绑定的服务器
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    app: Arc<Recurse>,
    active_connection: Arc<AtomicUsize>,
}

impl Server {
    pub fn local_addr(&self) -> Result<SocketAddr, Exception> {
        self.listener.local_addr().map_err(|e| {
            error!("无法获取监听地址: {}", e);
            Exception::BindFailed
        })
    }

    /// 当前正在处理的连接数
    pub fn active_connections(&self) -> usize {
        self.active_connection.load(Ordering::SeqCst)
    }

    /// 持续接受连接，直到进程退出
    pub async fn run(self) -> Result<(), Exception> {
        self.run_with_shutdown(future::pending()).await
    }

    /// 持续接受连接，直到 `shutdown` 完成。已经建立的连接继续在各自的任务中处理完。
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> Result<(), Exception>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut id: u128 = 0;

        // 主事件循环 (Accept Loop)
        loop {
            let accepted = tokio::select! {
                _ = &mut shutdown => {
                    info!("主循环接收到停机指令，正在退出...");
                    return Ok(());
                }
                accepted = self.listener.accept() => accepted,
            };
            let (mut stream, addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("接受连接失败：{}", e);
                    continue;
                }
            };
            debug!("[ID{}]新的连接：{}", id, addr);

            let app = Arc::clone(&self.app);
            let active_connection = Arc::clone(&self.active_connection);
            let conn_id = id;

            tokio::spawn(async move {
                let active = active_connection.fetch_add(1, Ordering::SeqCst) + 1;
                debug!("[ID{}]TCP连接已建立，当前活跃连接数: {}", conn_id, active);

                match handle_connection(&mut stream, conn_id, app.chain(), app.config()).await {
                    Ok(()) => debug!("[ID{}]连接处理完毕", conn_id),
                    Err(e) => warn!("[ID{}]连接异常结束：{}", conn_id, e),
                }

                active_connection.fetch_sub(1, Ordering::SeqCst);
            });
            id += 1;
        }
    }
}
