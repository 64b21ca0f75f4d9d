use std::{env, net::SocketAddr, path::PathBuf};
use tracing::warn;

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    Disk,
    Mock,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub upload_mode: UploadMode,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_dir = lookup("APP_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        let upload_dir = lookup("APP_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("public/uploads"));

        let upload_mode = match lookup("APP_UPLOAD_MODE").as_deref() {
            None | Some("disk") => UploadMode::Disk,
            Some("mock") => UploadMode::Mock,
            Some(other) => {
                warn!("unknown APP_UPLOAD_MODE '{other}', using disk");
                UploadMode::Disk
            }
        };

        Self {
            port,
            data_dir,
            upload_dir,
            upload_mode,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
