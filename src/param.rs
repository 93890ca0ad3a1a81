// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 框架协议参数与常量模块
//!
//! 该模块定义了 `recurse` 框架遵循的 HTTP/1.x 协议相关常量，包括：
//! - 常见的 HTTP 状态码及其原因短语（Reason Phrase）。
//! - 请求行（Request-Line）识别所用的预编译正则表达式。
//! - 响应序列化时使用的默认值。

use lazy_static::lazy_static;
use regex::bytes::Regex;
use std::collections::HashMap;

/// 服务器名称标识，仅用于日志输出
pub const SERVER_NAME: &str = "recurse";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 响应未设置 `content-type` 时使用的默认值
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// 请求没有携带协议版本（非 HTTP 输入）时，状态行使用的协议字符串
pub const DEFAULT_PROTO: &str = "HTTP/1.1";

/// 状态码为 0 表示“未设置”，在最终化时被替换为 200
pub const STATUS_UNSET: u16 = 0;

/// 未设置状态码时的默认值
pub const DEFAULT_STATUS: u16 = 200;

lazy_static! {
    /// 请求行形状：字母组成的方法、空格、包含 `/` 的目标、空格、`HTTP/x.y`，以 CRLF 结尾。
    ///
    /// 只在缓冲区起始位置匹配。正则对象本身不可变，可在多个连接间并发使用。
    pub static ref REQUEST_LINE: Regex =
        Regex::new(r"^[A-Za-z]+ [^ \r\n]*/[^ \r\n]* HTTP/[0-9]\.[0-9]\r\n").unwrap();
}

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 参考标准：[RFC 9110: HTTP Semantics](https://www.rfc-editor.org/rfc/rfc9110.html)。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        // 1xx: 信息响应 (Informational)
        map.insert(100, "Continue");
        map.insert(101, "Switching Protocols");
        
        // 2xx: 成功响应 (Successful)
        map.insert(200, "OK");
        map.insert(201, "Created");
        map.insert(202, "Accepted");
        map.insert(203, "Non-Authoritative Information");
        map.insert(204, "No Content");
        map.insert(205, "Reset Content");
        map.insert(206, "Partial Content");
        
        // 3xx: 重定向 (Redirection)
        map.insert(300, "Multiple Choices");
        map.insert(301, "Moved Permanently");
        map.insert(302, "Found");
        map.insert(303, "See Other");
        map.insert(304, "Not Modified");
        map.insert(305, "Use Proxy");
        // 306 已弃用 (Reserved)
        map.insert(307, "Temporary Redirect");
        map.insert(308, "Permanent Redirect");
        
        // 4xx: 客户端错误 (Client Error)
        map.insert(400, "Bad Request");
        map.insert(401, "Unauthorized");
        map.insert(402, "Payment Required");
        map.insert(403, "Forbidden");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");
        map.insert(406, "Not Acceptable");
        map.insert(407, "Proxy Authentication Required");
        map.insert(408, "Request Timeout");
        map.insert(409, "Conflict");
        map.insert(410, "Gone");
        map.insert(411, "Length Required");
        map.insert(412, "Precondition Failed");
        map.insert(413, "Content Too Large");
        map.insert(414, "URI Too Long");
        map.insert(415, "Unsupported Media Type");
        map.insert(416, "Range Not Satisfiable");
        map.insert(417, "Expectation Failed");
        map.insert(418, "I'm a teapot");
        map.insert(421, "Misdirected Request");
        map.insert(422, "Unprocessable Content");
        map.insert(426, "Upgrade Required");
        
        // 5xx: 服务端错误 (Server Error)
        map.insert(500, "Internal Server Error");
        map.insert(501, "Not Implemented");
        map.insert(502, "Bad Gateway");
        map.insert(503, "Service Unavailable");
        map.insert(504, "Gateway Timeout");
        map.insert(505, "HTTP Version Not Supported");
        map
    };
}

/// 查询状态码对应的原因短语。
///
/// 未知状态码返回 `None`，由调用方决定兜底策略。
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    STATUS_CODES.get(&code).copied()
}

/// 判断缓冲区开头是否是一个可识别的请求行
pub fn is_request_line(buffer: &[u8]) -> bool {
    REQUEST_LINE.is_match(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_phrase_known() {
        assert_eq!(reason_phrase(200), Some("OK"));
        assert_eq!(reason_phrase(404), Some("Not Found"));
        assert_eq!(reason_phrase(500), Some("Internal Server Error"));
    }

    #[test]
    fn test_reason_phrase_unknown() {
        assert_eq!(reason_phrase(299), None);
        assert_eq!(reason_phrase(STATUS_UNSET), None);
    }

    #[test]
    fn test_request_line_get() {
        assert!(is_request_line(b"GET / HTTP/1.1\r\n"));
        assert!(is_request_line(b"POST /api/items?id=1 HTTP/1.0\r\nHost: x\r\n\r\n"));
    }

    #[test]
    fn test_request_line_lowercase_method() {
        assert!(is_request_line(b"get /index.html HTTP/1.1\r\n"));
    }

    #[test]
    fn test_request_line_requires_crlf() {
        assert!(!is_request_line(b"GET / HTTP/1.1"));
        assert!(!is_request_line(b"GET / HTTP/1.1\n"));
    }

    #[test]
    fn test_request_line_rejects_garbage() {
        assert!(!is_request_line(b"hello"));
        assert!(!is_request_line(b"OPTIONS * HTTP/1.1\r\n"));
        assert!(!is_request_line(b"GET / HTTP/2\r\n"));
        assert!(!is_request_line(b"\r\nGET / HTTP/1.1\r\n"));
        assert!(!is_request_line(b"1GET / HTTP/1.1\r\n"));
    }

    #[test]
    fn test_request_line_only_at_start() {
        assert!(!is_request_line(b"xx GET / HTTP/1.1\r\n"));
    }
}
