// ==========================================
// 商品主码系统 - 网络同步客户端
// ==========================================
// 职责: 通过外部平台 HTTP API 写回主码
// 凭证: bearer token 缓存 + 到期前安全边际内主动刷新，
//       刷新在 tokio Mutex 下合并（并发调用不会重复取号）
// 调用: PUT {base}/products/{external_id}，单次调用受 timeout 约束
// ==========================================

use crate::config::ExternalApiConfig;
use crate::sync::client::ExternalSyncClient;
use crate::sync::error::SyncError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

/// 到期前多久视为需要刷新
const TOKEN_SAFETY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    shop_no: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// 有效期（秒）
    expires_in: u64,
}

#[derive(Serialize)]
struct UpdateCodeBody<'a> {
    custom_product_code: &'a str,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

pub struct NetworkedSyncClient {
    http: reqwest::Client,
    config: ExternalApiConfig,
    call_timeout: Duration,
    // 缓存与刷新共用一把锁，保证同一时刻至多一个在途取号请求
    token_cache: Mutex<Option<CachedToken>>,
}

impl NetworkedSyncClient {
    pub fn new(config: ExternalApiConfig) -> Result<Self, reqwest::Error> {
        let call_timeout = Duration::from_millis(config.timeout_ms);
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            config,
            call_timeout,
            token_cache: Mutex::new(None),
        })
    }

    fn classify(&self, err: reqwest::Error) -> SyncError {
        if err.is_timeout() {
            SyncError::Timeout {
                timeout_ms: self.call_timeout.as_millis() as u64,
            }
        } else {
            SyncError::Transport(err.to_string())
        }
    }

    /// 获取有效 token（缓存命中直接返回，否则在锁内刷新）
    async fn bearer_token(&self) -> Result<String, SyncError> {
        let mut cache = self.token_cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            // 距到期仍有安全边际时直接复用
            if Instant::now() + TOKEN_SAFETY_MARGIN < cached.expires_at {
                return Ok(cached.token.clone());
            }
        }

        // 持锁刷新: 并发到达的调用方会在锁上排队，醒来后命中新缓存
        let issued = self.fetch_token().await?;
        let token = issued.token.clone();
        *cache = Some(issued);
        Ok(token)
    }

    async fn fetch_token(&self) -> Result<CachedToken, SyncError> {
        let url = format!("{}/oauth/token", self.config.base_url);
        let body = TokenRequest {
            grant_type: "client_credentials",
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            shop_no: &self.config.shop_no,
        };

        let response = self
            .http
            .post(&url)
            .timeout(self.call_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::CredentialError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::CredentialError(format!(
                "token 接口返回 {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| SyncError::CredentialError(format!("token 响应解析失败: {}", e)))?;

        info!(expires_in = parsed.expires_in, "外部平台凭证已刷新");
        Ok(CachedToken {
            token: parsed.access_token,
            expires_at: Instant::now() + Duration::from_secs(parsed.expires_in),
        })
    }
}

#[async_trait]
impl ExternalSyncClient for NetworkedSyncClient {
    async fn update_code(&self, external_id: &str, master_code: &str) -> Result<(), SyncError> {
        let token = self.bearer_token().await?;
        let url = format!("{}/products/{}", self.config.base_url, external_id);

        let response = self
            .http
            .put(&url)
            .timeout(self.call_timeout)
            .bearer_auth(&token)
            .json(&UpdateCodeBody {
                custom_product_code: master_code,
            })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        debug!(external_id, master_code, "主码已写入外部平台");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 本地 HTTP 桩: 统计 token 接口命中次数，商品接口按给定状态码与响应体应答
    async fn start_stub(
        token_calls: Arc<AtomicUsize>,
        put_status: u16,
        put_body: &'static str,
    ) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let token_calls = token_calls.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    loop {
                        let n = match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => n,
                        };
                        buf.extend_from_slice(&chunk[..n]);
                        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n")
                        else {
                            continue;
                        };
                        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
                        let content_length = head
                            .lines()
                            .find_map(|line| {
                                line.to_ascii_lowercase()
                                    .strip_prefix("content-length:")
                                    .and_then(|v| v.trim().parse::<usize>().ok())
                            })
                            .unwrap_or(0);
                        if buf.len() - (head_end + 4) < content_length {
                            continue;
                        }

                        let response = if head.starts_with("POST /oauth/token") {
                            token_calls.fetch_add(1, Ordering::SeqCst);
                            let body = r#"{"access_token":"tok-stub","expires_in":3600}"#;
                            format!(
                                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                body.len(),
                                body
                            )
                        } else {
                            format!(
                                "HTTP/1.1 {} Stub\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                put_status,
                                put_body.len(),
                                put_body
                            )
                        };
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        return;
                    }
                });
            }
        });

        format!("http://{}", addr)
    }

    fn stub_config(base_url: String) -> ExternalApiConfig {
        ExternalApiConfig {
            base_url,
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            shop_no: "shop-1".to_string(),
            timeout_ms: 5000,
        }
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_one_token_fetch() {
        let token_calls = Arc::new(AtomicUsize::new(0));
        let base_url = start_stub(token_calls.clone(), 200, "{}").await;
        let client = Arc::new(NetworkedSyncClient::new(stub_config(base_url)).unwrap());

        let mut handles = Vec::new();
        for i in 0..8 {
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                client
                    .update_code(&format!("ext-{}", i), "CATE9-00001")
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // 并发调用在缓存锁上排队，取号请求只发一次
        assert_eq!(token_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_carries_status_and_body() {
        let token_calls = Arc::new(AtomicUsize::new(0));
        let base_url = start_stub(token_calls.clone(), 500, "internal failure").await;
        let client = NetworkedSyncClient::new(stub_config(base_url)).unwrap();

        let err = client.update_code("ext-1", "CATE9-00001").await.unwrap_err();
        match err {
            SyncError::HttpStatus { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "internal failure");
            }
            other => panic!("错误类型不符: {:?}", other),
        }
    }

    fn test_config() -> ExternalApiConfig {
        ExternalApiConfig {
            base_url: "https://api.example.com".to_string(),
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            shop_no: "shop-1".to_string(),
            timeout_ms: 2500,
        }
    }

    #[test]
    fn test_call_timeout_comes_from_config() {
        let client = NetworkedSyncClient::new(test_config()).unwrap();
        assert_eq!(client.call_timeout, Duration::from_millis(2500));
    }

    #[tokio::test]
    async fn test_cached_token_is_reused_within_margin() {
        let client = NetworkedSyncClient::new(test_config()).unwrap();
        {
            let mut cache = client.token_cache.lock().await;
            *cache = Some(CachedToken {
                token: "tok-1".to_string(),
                expires_at: Instant::now() + Duration::from_secs(3600),
            });
        }

        let token = client.bearer_token().await.unwrap();
        assert_eq!(token, "tok-1");
    }
}
