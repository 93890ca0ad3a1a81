// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 连接处理模块
//!
//! 每个 TCP 连接对应一个 `Connection` 上下文，独占一对 `Request`/`Response`，
//! 随连接关闭一起释放。连接任务负责：
//! 1. 读取数据块并交给解析器。
//! 2. 请求完整后调用中间件链，且只调用一次。
//! 3. 写出最终化后的报文并关闭连接。
//!
//! 每个连接最多处理一个请求，不支持 keep-alive。

use crate::{
    config::Config, exception::Exception, middleware::MiddlewareChain, request::Request,
    response::Response,
};

use bytes::Bytes;
use log::{debug, error, warn};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// 一次数据到达之后连接的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 请求尚未接收完整，继续等待数据
    Pending,
    /// 中间件链已最终化响应，发送这些字节后关闭连接
    Reply(Bytes),
    /// 中间件链已耗尽，但没有任何中间件调用 `end`
    Unfinished,
    /// 请求已经处理过，后续到达的数据被丢弃
    Ignored,
}

/// 单个连接的上下文
#[derive(Debug)]
pub struct Connection {
    id: u128,
    request: Request,
    response: Response,
    dispatched: bool,
}

impl Connection {
    pub fn new(id: u128) -> Self {
        Self {
            id,
            request: Request::new(id),
            response: Response::new(),
            dispatched: false,
        }
    }

    /// 处理一块新到达的数据。
    ///
    /// 请求第一次被判定为完整时调用中间件链。
    pub fn receive(&mut self, chunk: &[u8], chain: &MiddlewareChain) -> Outcome {
        if self.dispatched {
            debug!("[ID{}]请求已处理，忽略{}字节后续数据", self.id, chunk.len());
            return Outcome::Ignored;
        }

        self.request.feed(chunk);
        self.request.parse();
        if !self.request.is_complete() {
            debug!(
                "[ID{}]请求体{}/{}字节，继续等待",
                self.id,
                self.request.body_length(),
                self.request.content_length()
            );
            return Outcome::Pending;
        }

        self.dispatched = true;
        debug!("[ID{}]HTTP请求接收完毕，开始调用中间件", self.id);
        chain.dispatch(&mut self.request, &mut self.response);

        match self.response.take_reply() {
            Some(reply) => Outcome::Reply(reply),
            None => {
                warn!("[ID{}]中间件链已耗尽但响应未最终化", self.id);
                Outcome::Unfinished
            }
        }
    }

    pub fn id(&self) -> u128 {
        self.id
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn is_dispatched(&self) -> bool {
        self.dispatched
    }
}

/// # 连接处理器
///
/// 负责单个连接的生命周期：反复读取数据，直到请求完整并得到响应、对端关闭或空闲超时。
///
/// 只有传输层错误会以 `Exception` 返回。写出失败时连接同样会被关闭。
pub async fn handle_connection<S>(
    stream: &mut S,
    id: u128,
    chain: &MiddlewareChain,
    config: &Config,
) -> Result<(), Exception>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut connection = Connection::new(id);
    let mut buffer = vec![0; config.read_buffer_size()];

    loop {
        let n = match read_chunk(stream, &mut buffer, config.read_timeout()).await {
            Ok(n) => n,
            Err(Exception::ReadTimeout) => {
                warn!("[ID{}]连接空闲超时，关闭连接", id);
                let _ = stream.shutdown().await;
                return Err(Exception::ReadTimeout);
            }
            Err(e) => {
                error!("[ID{}]读取连接时遇到错误", id);
                return Err(e);
            }
        };
        if n == 0 {
            debug!("[ID{}]客户端关闭了连接", id);
            return Ok(());
        }
        debug!("[ID{}]收到{}字节", id, n);

        match connection.receive(&buffer[..n], chain) {
            Outcome::Reply(reply) => return send_reply(stream, id, &reply).await,
            Outcome::Pending | Outcome::Unfinished | Outcome::Ignored => continue,
        }
    }
}

async fn read_chunk<S>(
    stream: &mut S,
    buffer: &mut [u8],
    timeout: Option<Duration>,
) -> Result<usize, Exception>
where
    S: AsyncRead + Unpin,
{
    let result = match timeout {
        Some(t) => match tokio::time::timeout(t, stream.read(buffer)).await {
            Ok(r) => r,
            Err(_) => return Err(Exception::ReadTimeout),
        },
        None => stream.read(buffer).await,
    };
    result.map_err(|e| {
        error!("读取数据失败: {}", e);
        Exception::ReadFailed
    })
}

/// 写出响应报文并关闭连接，写出失败时也会尝试关闭
async fn send_reply<S>(stream: &mut S, id: u128, reply: &[u8]) -> Result<(), Exception>
where
    S: AsyncWrite + Unpin,
{
    debug!("[ID{}]发送全量响应，长度: {}", id, reply.len());
    let mut write_result = stream.write_all(reply).await;
    if write_result.is_ok() {
        write_result = stream.flush().await;
    }
    let close_result = stream.shutdown().await;

    if let Err(e) = write_result {
        error!("[ID{}]发送响应失败: {}", id, e);
        return Err(Exception::WriteFailed);
    }
    if let Err(e) = close_result {
        warn!("[ID{}]关闭连接失败: {}", id, e);
        return Err(Exception::CloseFailed);
    }
    debug!("[ID{}]响应发送完毕，连接已关闭", id);
    Ok(())
}
