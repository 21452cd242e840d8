use axum::body::Bytes;
use once_cell::sync::OnceCell;
use reqwest::Client;
use std::path::Path;

use crate::error::AppError;
use crate::features::card::loader::{FetchResponse, ResourceLoader};

/// 全局复用的 HTTP Client（统一连接池/Keep-Alive），避免每次请求重复创建。
static CLIENT_DEFAULT: OnceCell<Client> = OnceCell::new();

/// 默认配置的 HTTP Client（不额外设置 timeout）。
pub fn client_default() -> Result<&'static Client, reqwest::Error> {
    CLIENT_DEFAULT.get_or_try_init(|| Client::builder().build())
}


/// 生产环境的资源加载器：远程资源走 reqwest，本地文件走 tokio::fs。
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: Client,
}

impl HttpLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 复用全局默认 Client；渲染路径上的请求不设超时
    pub fn shared() -> Result<Self, reqwest::Error> {
        client_default().cloned().map(Self::new)
    }
}

impl ResourceLoader for HttpLoader {
    async fn get(&self, url: &str) -> Result<FetchResponse, AppError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(FetchResponse { status, body })
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes, AppError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::Asset(format!("读取 '{}' 失败: {e}", path.display())))?;
        Ok(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::HttpLoader;
    use crate::features::card::loader::ResourceLoader;

    #[tokio::test]
    async fn missing_local_file_is_asset_error() {
        let loader = HttpLoader::shared().expect("client");
        let err = loader
            .read_file(std::path::Path::new("./definitely/missing.png"))
            .await
            .expect_err("missing file");
        assert!(matches!(err, crate::error::AppError::Asset(_)));
    }
}
