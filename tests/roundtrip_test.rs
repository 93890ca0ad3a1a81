// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 序列化往返的性质测试：任意状态码、头部与响应体经过 `end` 之后，
//! 都能从报文中原样解析回来。

use recurse::{param::STATUS_CODES, Request, Response};

use proptest::prelude::*;
use std::collections::BTreeMap;

fn finished_reply(status: u16, headers: &BTreeMap<String, String>, body: &[u8]) -> Vec<u8> {
    let mut request = Request::new(0);
    request.feed(b"GET / HTTP/1.1\r\n\r\n");
    request.parse();

    let mut response = Response::new();
    response.set_status(status).set_body(body);
    for (key, value) in headers {
        response.set_header(key, value);
    }
    response.end(&request);
    response.take_reply().map(|b| b.to_vec()).unwrap_or_default()
}

/// 拆分报文：状态码、头部列表、响应体（去掉结尾 CRLF）
fn split(reply: &[u8]) -> (u16, Vec<(String, String)>, Vec<u8>) {
    let head_end = reply
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("reply has no header terminator");
    let head = String::from_utf8_lossy(&reply[..head_end]).to_string();
    let mut lines = head.split("\r\n");

    let status = lines
        .next()
        .and_then(|line| line.split(' ').nth(1))
        .and_then(|code| code.parse().ok())
        .expect("malformed status line");
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    assert!(reply.ends_with(b"\r\n"));
    let body = reply[head_end + 4..reply.len() - 2].to_vec();
    (status, headers, body)
}

fn known_status() -> impl Strategy<Value = u16> {
    let mut codes: Vec<u16> = STATUS_CODES.keys().copied().collect();
    codes.sort_unstable();
    prop::sample::select(codes)
}

proptest! {
    #[test]
    fn prop_reply_round_trip(
        status in known_status(),
        headers in prop::collection::btree_map("x-[a-z0-9]{1,8}", "[A-Za-z0-9]{0,12}", 0..6),
        body in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let reply = finished_reply(status, &headers, &body);
        let (parsed_status, parsed_headers, parsed_body) = split(&reply);

        prop_assert_eq!(parsed_status, status);
        prop_assert_eq!(&parsed_body, &body);

        let mut expected: Vec<(String, String)> = headers.into_iter().collect();
        expected.push(("content-length".to_string(), body.len().to_string()));
        expected.push(("content-type".to_string(), "text/plain".to_string()));
        prop_assert_eq!(parsed_headers, expected);
    }

    /// 同一请求无论如何切分到达，解析结果都一致
    #[test]
    fn prop_split_delivery_is_stable(
        body in prop::collection::vec(any::<u8>(), 0..64),
        cut in 1usize..16,
    ) {
        let mut raw = format!("POST /p HTTP/1.1\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
        raw.extend_from_slice(&body);

        let mut request = Request::new(0);
        for chunk in raw.chunks(cut) {
            request.feed(chunk);
            request.parse();
        }

        prop_assert!(request.is_complete());
        prop_assert_eq!(request.method(), "POST");
        prop_assert_eq!(request.body(), &body[..]);
        prop_assert_eq!(request.body_length(), body.len() as u64);
    }
}
