use num_cpus;
use serde_derive::Deserialize;

use crate::exception::Exception;

use log::{error, warn};
use std::fs::File;
use std::io::prelude::*;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_local")]
    local: bool,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default = "default_read_buffer_size")]
    read_buffer_size: usize,
    #[serde(default = "default_read_timeout_ms")]
    read_timeout_ms: u64,
}

fn default_port() -> u16 {
    7878
}

fn default_local() -> bool {
    true
}

fn default_read_buffer_size() -> usize {
    1024
}

fn default_read_timeout_ms() -> u64 {
    30000 // 30s
}

impl Config {
    pub fn new() -> Self {
        let mut config = Self {
            port: default_port(),
            local: default_local(),
            worker_threads: 0,
            read_buffer_size: default_read_buffer_size(),
            read_timeout_ms: default_read_timeout_ms(),
        };
        config.normalize();
        config
    }

    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let mut file = match File::open(filename) {
            Ok(f) => f,
            Err(e) => {
                error!("无法打开配置文件{}：{}", filename, e);
                return Err(Exception::ConfigUnreadable);
            }
        };
        let mut str_val = String::new();
        if let Err(e) = file.read_to_string(&mut str_val) {
            error!("读取配置文件{}失败：{}", filename, e);
            return Err(Exception::ConfigUnreadable);
        }
        Self::from_toml_str(&str_val)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, Exception> {
        let mut raw_config: Config = match toml::from_str(content) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象：{}", e);
                return Err(Exception::ConfigInvalid);
            }
        };
        raw_config.normalize();
        Ok(raw_config)
    }

    /// 读取配置文件，失败时使用默认配置
    pub fn load_or_default(filename: &str) -> Self {
        match Self::from_toml(filename) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}，使用默认配置", e);
                Config::new()
            }
        }
    }

    fn normalize(&mut self) {
        if self.worker_threads == 0 {
            self.worker_threads = num_cpus::get();
        }
        if self.read_buffer_size == 0 {
            warn!("read_buffer_size被设置为0，这会导致无法读取任何数据，因此该值将被改为1024。");
            self.read_buffer_size = default_read_buffer_size();
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local(&self) -> bool {
        self.local
    }

    /// 根据 `local` 决定监听回环地址还是全部地址
    pub fn address(&self) -> IpAddr {
        match self.local {
            true => IpAddr::V4(Ipv4Addr::LOCALHOST),
            false => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    /// 连接空闲超时，0 表示不限制
    pub fn read_timeout(&self) -> Option<Duration> {
        match self.read_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.read_timeout_ms = timeout.map_or(0, |t| (t.as_millis() as u64).max(1));
        self
    }

    pub fn set_read_buffer_size(&mut self, size: usize) -> &mut Self {
        self.read_buffer_size = size;
        self.normalize();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::new();

        assert_eq!(config.port(), 7878);
        assert!(config.local());
        assert_eq!(config.address(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(config.worker_threads() > 0);
        assert_eq!(config.read_buffer_size(), 1024);
        assert_eq!(config.read_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port = 9000\nlocal = false\nworker_threads = 2\nread_buffer_size = 4096\nread_timeout_ms = 0"
        )
        .unwrap();

        let config = Config::from_toml(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.port(), 9000);
        assert_eq!(config.address(), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.worker_threads(), 2);
        assert_eq!(config.read_buffer_size(), 4096);
        assert_eq!(config.read_timeout(), None);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = Config::from_toml_str("port = 8080").unwrap();

        assert_eq!(config.port(), 8080);
        assert!(config.local());
        assert_eq!(config.read_buffer_size(), 1024);
        assert!(config.worker_threads() > 0);
    }

    #[test]
    fn test_zero_buffer_size_normalized() {
        let config = Config::from_toml_str("read_buffer_size = 0").unwrap();
        assert_eq!(config.read_buffer_size(), 1024);
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_toml_str("port = \"not a number\"");
        assert_eq!(result.unwrap_err(), Exception::ConfigInvalid);
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_toml("/nonexistent/recurse/config.toml");
        assert_eq!(result.unwrap_err(), Exception::ConfigUnreadable);

        let config = Config::load_or_default("/nonexistent/recurse/config.toml");
        assert_eq!(config.port(), 7878);
    }

    #[test]
    fn test_set_read_timeout() {
        let mut config = Config::new();
        config.set_read_timeout(Some(Duration::from_millis(200)));
        assert_eq!(config.read_timeout(), Some(Duration::from_millis(200)));

        config.set_read_timeout(None);
        assert_eq!(config.read_timeout(), None);
    }
}
