use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::location::LocationSource;
use crate::shipment::Carrier;
use crate::types::{
    CreateOrderRequest, CreatedOrder, District, GhnEnvelope, PickupShift, Province, Ward,
};
use crate::{GhnError, GhnResult};

pub const SANDBOX_URL: &str = "https://dev-online-gateway.ghn.vn/shiip/public-api";

/// GHN 开放接口客户端
#[derive(Debug, Clone)]
pub struct GhnClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    shop_id: i64,
}

impl GhnClient {
    pub fn new<S: Into<String>>(http: reqwest::Client, base_url: S, token: S, shop_id: i64) -> Self {
        let base_url: String = base_url.into();
        GhnClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            shop_id,
        }
    }

    pub fn sandbox<S: Into<String>>(token: S, shop_id: i64) -> Self {
        Self::new(reqwest::Client::new(), SANDBOX_URL.to_string(), token.into(), shop_id)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("Token", &self.token)
            .header("ShopId", self.shop_id.to_string())
            .header("Content-Type", "application/json")
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> GhnResult<T> {
        let status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<GhnEnvelope<T>>(&body) {
            Ok(envelope) => envelope.into_result(),
            // 网关层错误不是统一结构, 直接带出原文
            Err(_) if !status.is_success() => Err(GhnError::Api {
                code: status.as_u16() as i32,
                message: String::from_utf8_lossy(&body).to_string(),
            }),
            Err(e) => Err(GhnError::from(e)),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> GhnResult<T> {
        debug!("ghn GET {}", path);
        let response = self.request(reqwest::Method::GET, path).send().await?;
        Self::decode(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> GhnResult<T> {
        debug!("ghn POST {}", path);
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn provinces(&self) -> GhnResult<Vec<Province>> {
        self.get("master-data/province").await
    }

    pub async fn districts(&self, province_id: i64) -> GhnResult<Vec<District>> {
        self.post("master-data/district", &json!({ "province_id": province_id }))
            .await
    }

    pub async fn wards(&self, district_id: i64) -> GhnResult<Vec<Ward>> {
        self.post("master-data/ward", &json!({ "district_id": district_id }))
            .await
    }

    pub async fn pickup_shifts(&self) -> GhnResult<Vec<PickupShift>> {
        self.get("v2/shift/date").await
    }

    pub async fn create_order(&self, request: &CreateOrderRequest) -> GhnResult<CreatedOrder> {
        self.post("v2/shipping-order/create", request).await
    }
}

#[async_trait]
impl LocationSource for GhnClient {
    async fn provinces(&self) -> GhnResult<Vec<Province>> {
        GhnClient::provinces(self).await
    }

    async fn districts(&self, province_id: i64) -> GhnResult<Vec<District>> {
        GhnClient::districts(self, province_id).await
    }

    async fn wards(&self, district_id: i64) -> GhnResult<Vec<Ward>> {
        GhnClient::wards(self, district_id).await
    }
}

#[async_trait]
impl Carrier for GhnClient {
    async fn create_order(&self, request: &CreateOrderRequest) -> GhnResult<CreatedOrder> {
        GhnClient::create_order(self, request).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn url_joins_paths() {
        let client = GhnClient::new(
            reqwest::Client::new(),
            "https://dev-online-gateway.ghn.vn/shiip/public-api/",
            "token",
            885,
        );
        assert_eq!(
            client.url("/master-data/province"),
            "https://dev-online-gateway.ghn.vn/shiip/public-api/master-data/province"
        );
        assert_eq!(
            GhnClient::sandbox("token", 885).url("v2/shift/date"),
            format!("{}/v2/shift/date", SANDBOX_URL)
        );
    }
}
