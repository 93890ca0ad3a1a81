// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应构建模块
//!
//! 中间件通过 `Response` 设置状态码、头部和响应体，最后调用 `end` 完成最终化。
//! 最终化时从请求复制协议版本与方法，未设置的状态码补为 200，
//! 并按固定格式序列化为待发送的报文字节。每个响应只会被最终化一次。

use crate::{
    header::HeaderMap,
    param::*,
    request::Request,
};

use bytes::{BufMut, Bytes, BytesMut};
use log::{debug, error, warn};

#[derive(Debug, Clone)]
pub struct Response {
    proto: String,
    method: String,
    status_code: u16,
    headers: HeaderMap,
    body: BytesMut,
    reply: Option<Bytes>,
    finished: bool,
}

impl Response {
    pub fn new() -> Self {
        Self {
            proto: String::new(),
            method: String::new(),
            status_code: STATUS_UNSET,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            reply: None,
            finished: false,
        }
    }

    pub fn set_status(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self
    }

    /// 设置头部字段，键会被转为小写
    pub fn set_header(&mut self, key: &str, value: &str) -> &mut Self {
        self.headers.insert(key, value);
        self
    }

    /// 替换整个响应体
    pub fn set_body(&mut self, body: impl AsRef<[u8]>) -> &mut Self {
        self.body.clear();
        self.body.extend_from_slice(body.as_ref());
        self
    }

    /// 在响应体末尾追加内容
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) -> &mut Self {
        self.body.extend_from_slice(chunk.as_ref());
        self
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// 最终化响应：从请求复制协议与方法，补全状态码，序列化为待发送的字节。
    ///
    /// 只有第一次调用生效，之后的调用直接返回。最终化之后对响应的修改不会影响已生成的报文。
    pub fn end(&mut self, request: &Request) {
        if self.finished {
            warn!("[ID{}]响应已经最终化，忽略重复的end调用", request.id());
            return;
        }

        self.method = request.method().to_string();
        self.proto = match request.proto() {
            "" => DEFAULT_PROTO.to_string(),
            proto => proto.to_string(),
        };
        if self.status_code == STATUS_UNSET {
            self.status_code = DEFAULT_STATUS;
        }

        let reply = self.render();
        debug!(
            "[ID{}]响应报文构建完成: {} {}，共{}字节",
            request.id(),
            self.status_code,
            self.information(),
            reply.len()
        );
        self.reply = Some(reply);
        self.finished = true;
    }

    /// 将响应序列化为报文字节。
    ///
    /// 格式依次为：状态行、头部（插入顺序）、空行、响应体、结尾 CRLF。
    /// `content-length` 总是按响应体实际长度重新计算；`content-type` 缺失时补为 `text/plain`。
    pub(crate) fn render(&mut self) -> Bytes {
        self.headers
            .insert("content-length", &self.body.len().to_string());
        if !self.headers.contains_key("content-type") {
            self.headers.insert("content-type", DEFAULT_CONTENT_TYPE);
        }

        let information = self.information();
        if information.is_empty() {
            error!("非法的状态码：{}，原因短语留空", self.status_code);
        }
        let status_line = format!("{} {} {}{}", self.proto, self.status_code, information, CRLF);

        let mut data = BytesMut::with_capacity(status_line.len() + self.body.len() + 128);
        data.put_slice(status_line.as_bytes());
        for (key, value) in self.headers.iter() {
            data.put_slice([key, ": ", value, CRLF].concat().as_bytes());
        }
        data.put_slice(CRLF.as_bytes());
        data.put_slice(&self.body);
        data.put_slice(CRLF.as_bytes());
        data.freeze()
    }

    /// 取走已生成的报文，交给连接层发送
    pub fn take_reply(&mut self) -> Option<Bytes> {
        self.reply.take()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// 当前状态码对应的原因短语，未知状态码为空串
    pub fn information(&self) -> &'static str {
        reason_phrase(self.status_code).unwrap_or("")
    }

    pub fn proto(&self) -> &str {
        &self.proto
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// 是否已经最终化
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
