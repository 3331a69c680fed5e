use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::converter::ConverterConfig;
use crate::policy::{PolicyConfig, MIB};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub encoder: ConverterConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Upload storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory uploads are written to and served from.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Ingress ceiling; larger payloads are rejected before reaching a worker.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Accepted MIME types and the extension stored files get.
    #[serde(default = "default_mime_types")]
    pub mime_types: BTreeMap<String, String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            mime_types: default_mime_types(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("/tmp/uploads")
}

fn default_max_upload_bytes() -> u64 {
    64 * MIB
}

fn default_mime_types() -> BTreeMap<String, String> {
    [
        ("image/png", "png"),
        ("image/jpeg", "jpg"),
        ("video/mp4", "mp4"),
    ]
    .into_iter()
    .map(|(mime, ext)| (mime.to_string(), ext.to_string()))
    .collect()
}

/// Observer notification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifyConfig {
    /// Outbound queue depth per observer. An observer whose queue is full
    /// when a broadcast arrives is disconnected.
    #[serde(default = "default_observer_buffer")]
    pub observer_buffer: usize,
    /// Whether text frames sent by an observer are relayed to every observer.
    #[serde(default = "default_relay")]
    pub relay_client_messages: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            observer_buffer: default_observer_buffer(),
            relay_client_messages: default_relay(),
        }
    }
}

fn default_observer_buffer() -> usize {
    64
}

fn default_relay() -> bool {
    true
}
