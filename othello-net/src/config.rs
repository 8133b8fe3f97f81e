//! 联机配置
//!
//! 以 JSON 文件持久化，默认位于系统配置目录下的 `othello-net/network.json`。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use protocol::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BIND_HOST, DEFAULT_PORT, DEFAULT_SERVER_HOST,
    HANDSHAKE_TIMEOUT_SECS, MAX_FRAME_SIZE, MOVE_TIMEOUT_SECS, WRITE_TIMEOUT_SECS,
};

/// 配置文件名
const CONFIG_FILE_NAME: &str = "network.json";

/// 帧大小下限，保证最长的消息也能放下
const MIN_FRAME_SIZE: usize = 64;

fn ceil_secs(timeout: Duration) -> u64 {
    timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0)
}

/// 网络配置
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// 主机绑定地址
    pub bind_host: String,
    /// 加入方连接的主机地址
    pub server_host: String,
    /// 端口（主机监听 / 加入方连接）
    pub port: u16,
    /// 连接超时（秒）
    pub connect_timeout_secs: u64,
    /// 加入方等待握手的超时（秒）
    pub handshake_timeout_secs: u64,
    /// 等待对手走棋的默认超时（秒）
    pub move_timeout_secs: u64,
    /// 单次发送的写超时（秒），对方长期不读时据此放弃并关闭会话
    pub write_timeout_secs: u64,
    /// 单帧最大字节数
    pub max_frame_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_BIND_HOST.to_string(),
            server_host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            handshake_timeout_secs: HANDSHAKE_TIMEOUT_SECS,
            move_timeout_secs: MOVE_TIMEOUT_SECS,
            write_timeout_secs: WRITE_TIMEOUT_SECS,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

impl NetworkConfig {
    pub fn with_bind_host(mut self, host: impl Into<String>) -> Self {
        self.bind_host = host.into();
        self
    }

    pub fn with_server_host(mut self, host: impl Into<String>) -> Self {
        self.server_host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// 设置等待走棋超时，不足一秒的部分向上取整
    pub fn with_move_timeout(mut self, timeout: Duration) -> Self {
        self.move_timeout_secs = ceil_secs(timeout);
        self
    }

    /// 设置写超时，不足一秒的部分向上取整
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout_secs = ceil_secs(timeout);
        self
    }

    /// 主机监听地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// 加入方连接地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    pub fn move_timeout(&self) -> Duration {
        Duration::from_secs(self.move_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    /// 检查配置取值
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_size < MIN_FRAME_SIZE {
            bail!(
                "max_frame_size must be at least {} bytes, got {}",
                MIN_FRAME_SIZE,
                self.max_frame_size
            );
        }
        if self.connect_timeout_secs == 0
            || self.handshake_timeout_secs == 0
            || self.write_timeout_secs == 0
        {
            bail!("connect, handshake and write timeouts must be positive");
        }
        Ok(())
    }

    /// 从 JSON 文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {:?}", path))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("配置文件格式错误: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// 保存为 JSON 文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("无法创建配置目录: {:?}", parent))?;
            }
        }
        let content = serde_json::to_string_pretty(self).context("序列化配置失败")?;
        fs::write(path, content).with_context(|| format!("无法写入配置文件: {:?}", path))?;
        Ok(())
    }

    /// 默认配置文件路径
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("othello-net").join(CONFIG_FILE_NAME))
    }

    /// 加载默认路径的配置，不存在时使用默认值
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:12345");
        assert_eq!(config.server_addr(), "127.0.0.1:12345");
        assert_eq!(config.move_timeout(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("network.json");

        let config = NetworkConfig::default()
            .with_server_host("192.168.1.20")
            .with_port(23456);
        config.save(&path).unwrap();

        let loaded = NetworkConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        fs::write(&path, r#"{"port": 4000}"#).unwrap();

        let loaded = NetworkConfig::load(&path).unwrap();
        assert_eq!(loaded.port, 4000);
        assert_eq!(loaded.bind_host, "0.0.0.0");
        assert_eq!(loaded.move_timeout_secs, 300);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        fs::write(&path, r#"{"max_frame_size": 8}"#).unwrap();
        assert!(NetworkConfig::load(&path).is_err());

        fs::write(&path, "not json").unwrap();
        assert!(NetworkConfig::load(&path).is_err());

        assert!(NetworkConfig::load(dir.path().join("missing.json")).is_err());

        let config = NetworkConfig {
            write_timeout_secs: 0,
            ..NetworkConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sub_second_timeouts_round_up() {
        let config = NetworkConfig::default()
            .with_move_timeout(Duration::from_millis(500))
            .with_write_timeout(Duration::from_millis(1500));
        assert_eq!(config.move_timeout(), Duration::from_secs(1));
        assert_eq!(config.write_timeout(), Duration::from_secs(2));

        let config = config.with_move_timeout(Duration::from_secs(3));
        assert_eq!(config.move_timeout(), Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }
}
