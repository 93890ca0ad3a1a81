// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 该模块负责把一个连接上陆续到达的原始字节增量地还原为 `Request`。它涵盖了：
//! 1. 请求行（Request-Line）的识别与解析（方法、目标、协议版本）。
//! 2. 头部字段（Headers）的提取，键统一小写。
//! 3. 请求体（Body）的累积，以及基于 `content-length` 的完整性判断。
//!
//! 解析器可以在每次有新数据到达时反复调用。已解析的前缀不会被重复处理，
//! 请求体只追加游标之后的新字节，因此不会出现重复增长。

use crate::{
    header::HeaderMap,
    param::is_request_line,
};

use bytes::BytesMut;
use log::{debug, warn};
use std::borrow::Cow;

/// 解析器当前所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// 尚未识别出请求行。此阶段下整个缓冲区被当作不透明的请求体。
    RequestLine,
    /// 请求行已解析，正在逐行读取头部
    Headers,
    /// 已越过头部与正文之间的空行
    Body,
}

/// 一个连接上正在接收的 HTTP 请求。
///
/// 每个连接恰好拥有一个 `Request`，生命周期与连接相同。
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP 请求方法，大写
    method: String,
    /// 请求目标
    url: String,
    /// 协议版本字符串，例如 `HTTP/1.1`
    proto: String,
    headers: HeaderMap,
    body: Vec<u8>,
    /// 已累积的请求体字节数，与 `content-length` 比较以判断完整性
    body_length: u64,
    /// 该连接到目前为止收到的全部字节
    buffer: BytesMut,
    /// `buffer` 中已被解析的前缀长度
    cursor: usize,
    phase: Phase,
    /// 所属连接的标识，仅用于日志追踪
    id: u128,
}

impl Request {
    pub fn new(id: u128) -> Self {
        Self {
            method: String::new(),
            url: String::new(),
            proto: String::new(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            body_length: 0,
            buffer: BytesMut::new(),
            cursor: 0,
            phase: Phase::RequestLine,
            id,
        }
    }

    /// 追加一段从连接上读到的字节，不做解析
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// 对目前累积的全部字节进行解析，就地更新请求字段。
    ///
    /// # 逻辑步骤
    /// 1. 缓冲区开头不是合法请求行时，整个缓冲区原样作为请求体，方法/目标/版本保持为空。
    /// 2. 识别出请求行后，按 CRLF 逐行读取头部，直到遇到空行。
    /// 3. 空行之后的字节原样追加到请求体。
    ///
    /// 不完整的行会留在游标之后，等待下一次调用。
    pub fn parse(&mut self) {
        if self.phase == Phase::RequestLine {
            if !is_request_line(&self.buffer) {
                // 宽松兜底：非 HTTP 输入整体视为请求体
                self.body.clear();
                self.body.extend_from_slice(&self.buffer);
                self.body_length = self.body.len() as u64;
                debug!(
                    "[ID{}]未识别到请求行，{}字节数据作为请求体处理",
                    self.id,
                    self.body.len()
                );
                return;
            }
            self.body.clear();
            self.body_length = 0;
            self.cursor = 0;
            self.phase = Phase::Headers;
        }

        let mut first_line = self.cursor == 0;
        while self.phase == Phase::Headers {
            let end = match find_crlf(&self.buffer, self.cursor) {
                Some(end) => end,
                None => break,
            };
            let line = String::from_utf8_lossy(&self.buffer[self.cursor..end]).into_owned();
            self.cursor = end + 2;

            if first_line && !line.contains(':') {
                self.parse_request_line(&line);
            } else if line.is_empty() {
                self.phase = Phase::Body;
            } else {
                if first_line {
                    warn!("[ID{}]首行含有冒号，按头部行处理：{}", self.id, line);
                }
                self.parse_header_line(&line);
            }
            first_line = false;
        }

        if self.phase == Phase::Body && self.cursor < self.buffer.len() {
            self.body.extend_from_slice(&self.buffer[self.cursor..]);
            self.cursor = self.buffer.len();
            self.body_length = self.body.len() as u64;
        }

        debug!(
            "[ID{}]请求对象已填充: {} {} {} [{}] 请求体{}字节",
            self.id, self.method, self.url, self.proto, self.headers, self.body_length
        );
    }

    fn parse_request_line(&mut self, line: &str) {
        let mut parts = line.splitn(3, ' ');
        self.method = parts.next().unwrap_or_default().to_uppercase();
        self.url = parts.next().unwrap_or_default().trim().to_string();
        self.proto = parts.next().unwrap_or_default().trim().to_string();
    }

    fn parse_header_line(&mut self, line: &str) {
        match line.split_once(':') {
            Some((key, value)) => self.headers.insert(key.trim(), value.trim()),
            None => {
                warn!("[ID{}]头部行缺少冒号：{}", self.id, line);
                self.headers.insert(line.trim(), "");
            }
        }
    }

    /// 请求声明的正文长度。缺失或无法解析时视为 0。
    pub fn content_length(&self) -> u64 {
        self.headers
            .get("content-length")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
    }

    /// 判断请求是否已接收完毕，可以交给中间件链处理。
    ///
    /// - 非 HTTP 输入：立即完整。请求行被拆在多个数据块中时，第一块会被当作非 HTTP 输入调度，
    ///   这是已知的缺陷。
    /// - 头部尚未以空行结束：不完整。
    /// - 其余情况：已累积的请求体不小于 `content-length` 时完整。
    pub fn is_complete(&self) -> bool {
        match self.phase {
            Phase::RequestLine => true,
            Phase::Headers => false,
            Phase::Body => self.body_length >= self.content_length(),
        }
    }
}

// --- Getter 访问器实现 ---

impl Request {
    /// 获取请求方法，非 HTTP 输入时为空
    pub fn method(&self) -> &str {
        &self.method
    }

    /// 获取请求目标（含查询参数）
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 获取协议版本字符串
    pub fn proto(&self) -> &str {
        &self.proto
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// 按名称读取单个头部（大小写不敏感）
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// 是否收到了数据但没有识别出请求行
    pub fn is_opaque(&self) -> bool {
        self.phase == Phase::RequestLine && !self.buffer.is_empty()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// 以字符串形式读取请求体，非法 UTF-8 字节被替换
    pub fn body_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn body_length(&self) -> u64 {
        self.body_length
    }

    /// 该连接迄今收到的全部原始字节
    pub fn raw(&self) -> &[u8] {
        &self.buffer
    }

    /// 所属连接的标识
    pub fn id(&self) -> u128 {
        self.id
    }
}

fn find_crlf(buffer: &[u8], from: usize) -> Option<usize> {
    buffer
        .get(from..)?
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|pos| from + pos)
}
