// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 示例服务器
//!
//! 演示如何使用 `recurse` 搭建一个最小的 HTTP 服务：
//! - 访问日志中间件
//! - 问候/回显中间件：请求带正文时原样回显，否则返回问候语
//! - 终结中间件：调用 `end` 发送响应并关闭连接

use recurse::{param::SERVER_NAME, Config, Next, Recurse, Request, Response};

use log::{error, info, LevelFilter};
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config as LogConfig, Root},
    encode::pattern::PatternEncoder,
};
use std::{net::SocketAddr, process};
use tokio::runtime::Builder;

const LOG_CONFIG: &str = "config/log4rs.yaml";
const SERVER_CONFIG: &str = "config/development.toml";

fn main() {
    // 1. 初始化日志系统：优先使用外部 YAML 配置，缺失时退回到控制台输出
    init_logger();

    // 2. 环境配置加载：从 TOML 文件读取运行参数
    let config = Config::load_or_default(SERVER_CONFIG);
    info!("配置文件已载入");

    // 3. 异步运行时定制：根据配置文件动态分配工作线程数
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建异步运行时：{}", e);
            process::exit(1);
        }
    };

    // 4. 注册中间件，顺序即执行顺序
    let mut app = Recurse::with_config(config.clone());
    app.use_middleware(access_log)
        .use_middleware(greeting)
        .use_middleware(|req: &mut Request, res: &mut Response, _next: Next<'_>| {
            Recurse::end(req, res);
        });

    // 5. 网络层初始化并进入主事件循环
    let socket = SocketAddr::new(config.address(), config.port());
    info!("{}将在{}上监听Socket连接", SERVER_NAME, socket);
    let result = runtime.block_on(async move {
        let server = app.bind(socket).await?;
        server
            .run_with_shutdown(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("无法监听停机信号：{}", e);
                }
            })
            .await
    });

    if let Err(e) = result {
        error!("服务器异常退出：{}", e);
        process::exit(1);
    }
}

fn init_logger() {
    if let Err(e) = log4rs::init_file(LOG_CONFIG, Default::default()) {
        eprintln!("无法从{}载入日志配置：{}，改用控制台输出", LOG_CONFIG, e);
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(
                "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {m}{n}",
            )))
            .build();
        let config = LogConfig::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .build(Root::builder().appender("stdout").build(LevelFilter::Info));
        match config {
            Ok(config) => {
                if let Err(e) = log4rs::init_config(config) {
                    eprintln!("无法初始化日志系统：{}", e);
                }
            }
            Err(e) => eprintln!("日志配置无效：{}", e),
        }
    }
}

/// 结构化访问日志，便于后期审计
fn access_log(req: &mut Request, res: &mut Response, next: Next<'_>) {
    info!(
        "[ID{}] {}, {}, {}, {}, {}",
        req.id(),
        req.method(),
        req.url(),
        req.proto(),
        req.header("user-agent").unwrap_or("-"),
        req.body_length(),
    );
    next.call(req, res);
}

fn greeting(req: &mut Request, res: &mut Response, next: Next<'_>) {
    if req.body().is_empty() {
        res.write(format!("Hello from {}! You requested {}", SERVER_NAME, req.url()));
    } else {
        if let Some(content_type) = req.header("content-type") {
            res.set_header("content-type", content_type);
        }
        res.write(req.body().to_vec());
    }
    next.call(req, res);
}
