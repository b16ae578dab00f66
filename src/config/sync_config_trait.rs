// ==========================================
// 商品主码系统 - 同步配置读取 Trait
// ==========================================
// 职责: 定义推送模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

/// 外部 API 接入配置（凭据齐全时才能构造）
#[derive(Debug, Clone)]
pub struct ExternalApiConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub shop_no: String,
    /// 单次调用超时（毫秒）
    pub timeout_ms: u64,
}

// ==========================================
// SyncConfigReader Trait
// ==========================================
// 用途: 推送模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait SyncConfigReader: Send + Sync {
    /// 获取外部 API 基础地址
    ///
    /// # 返回
    /// - Some(String): 已配置的 base_url
    /// - None: 未配置
    async fn get_base_url(&self) -> Result<Option<String>, Box<dyn Error>>;

    /// 获取外部 API client_id
    async fn get_client_id(&self) -> Result<Option<String>, Box<dyn Error>>;

    /// 获取外部 API client_secret
    async fn get_client_secret(&self) -> Result<Option<String>, Box<dyn Error>>;

    /// 获取店铺编号
    async fn get_shop_no(&self) -> Result<Option<String>, Box<dyn Error>>;

    /// 获取单次调用超时（毫秒）
    ///
    /// # 默认值
    /// - 10000
    async fn get_timeout_ms(&self) -> Result<u64, Box<dyn Error>>;

    /// 获取完整的外部 API 接入配置
    ///
    /// # 返回
    /// - Some(ExternalApiConfig): base_url/client_id/client_secret/shop_no 全部已配置
    /// - None: 任一凭据缺失（调用方应回退到模拟客户端）
    async fn get_external_api_config(&self) -> Result<Option<ExternalApiConfig>, Box<dyn Error>> {
        let base_url = match self.get_base_url().await? {
            Some(v) => v,
            None => return Ok(None),
        };
        let client_id = match self.get_client_id().await? {
            Some(v) => v,
            None => return Ok(None),
        };
        let client_secret = match self.get_client_secret().await? {
            Some(v) => v,
            None => return Ok(None),
        };
        let shop_no = match self.get_shop_no().await? {
            Some(v) => v,
            None => return Ok(None),
        };

        Ok(Some(ExternalApiConfig {
            base_url,
            client_id,
            client_secret,
            shop_no,
            timeout_ms: self.get_timeout_ms().await?,
        }))
    }
}
