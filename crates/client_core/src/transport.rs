use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::LineId,
    error::ErrorBody,
    protocol::{
        CartUpdateRequest, CartUpdateResponse, ClassificationResponse, CLASSIFY_FILE_FIELD,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::{error::RequestError, settings::ClientSettings, types::ImageFile};

pub const DEFAULT_CLASSIFY_PATH: &str = "/breed-detect";
pub const DEFAULT_CART_UPDATE_PATH: &str = "/cart/update/{id}";
const LINE_ID_PLACEHOLDER: &str = "{id}";

/// The two storefront calls the controllers depend on.
///
/// Implementations issue exactly one request per call and never retry.
#[async_trait]
pub trait StorefrontBackend: Send + Sync {
    async fn classify_image(&self, file: &ImageFile)
        -> Result<ClassificationResponse, RequestError>;
    async fn update_cart_line(
        &self,
        line_id: LineId,
        quantity: u32,
    ) -> Result<CartUpdateResponse, RequestError>;
}

pub struct HttpStorefrontClient {
    http: Client,
    base_url: Url,
    classify_path: String,
    cart_update_path: String,
}

impl HttpStorefrontClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::build(
            Client::new(),
            base_url,
            DEFAULT_CLASSIFY_PATH,
            DEFAULT_CART_UPDATE_PATH,
        )
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().context("failed to build http client")?;
        Self::build(
            http,
            &settings.base_url,
            &settings.classify_path,
            &settings.cart_update_path,
        )
    }

    fn build(
        http: Client,
        base_url: &str,
        classify_path: &str,
        cart_update_path: &str,
    ) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid base url: {base_url}"))?;
        if !cart_update_path.contains(LINE_ID_PLACEHOLDER) {
            anyhow::bail!(
                "cart update path '{cart_update_path}' must contain {LINE_ID_PLACEHOLDER}"
            );
        }
        let client = Self {
            http,
            base_url,
            classify_path: classify_path.to_string(),
            cart_update_path: cart_update_path.to_string(),
        };
        client
            .classify_url()
            .with_context(|| format!("invalid classify path: {classify_path}"))?;
        client
            .cart_update_url(LineId(0))
            .with_context(|| format!("invalid cart update path: {cart_update_path}"))?;
        Ok(client)
    }

    pub fn classify_url(&self) -> Result<Url, url::ParseError> {
        self.base_url.join(&self.classify_path)
    }

    pub fn cart_update_url(&self, line_id: LineId) -> Result<Url, url::ParseError> {
        let path = self
            .cart_update_path
            .replace(LINE_ID_PLACEHOLDER, &line_id.to_string());
        self.base_url.join(&path)
    }

    pub async fn send_json<B, T>(&self, endpoint: Url, body: &B) -> Result<T, RequestError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = self
            .http
            .post(endpoint.clone())
            .header("X-Requested-With", "XMLHttpRequest")
            .json(body);
        self.dispatch(endpoint, request).await
    }

    pub async fn send_multipart<T>(
        &self,
        endpoint: Url,
        form: multipart::Form,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
    {
        let request = self.http.post(endpoint.clone()).multipart(form);
        self.dispatch(endpoint, request).await
    }

    async fn dispatch<T>(&self, endpoint: Url, request: RequestBuilder) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
    {
        debug!(endpoint = %endpoint, "http: sending request");
        let response = request.send().await.map_err(|err| {
            warn!(endpoint = %endpoint, timed_out = err.is_timeout(), "http: no response: {err}");
            RequestError::transport(&err)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.bytes().await {
                Ok(body) => serde_json::from_slice::<ErrorBody>(&body)
                    .ok()
                    .and_then(|body| body.visible_message().map(str::to_string)),
                Err(_) => None,
            };
            warn!(
                endpoint = %endpoint,
                status = status.as_u16(),
                has_message = message.is_some(),
                "http: request rejected"
            );
            return Err(RequestError::Application {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| RequestError::transport(&err))?;
        serde_json::from_slice(&body).map_err(|err| {
            warn!(endpoint = %endpoint, status = status.as_u16(), "http: undecodable body: {err}");
            RequestError::Application {
                status: status.as_u16(),
                message: None,
            }
        })
    }
}

fn endpoint_error(err: url::ParseError) -> RequestError {
    RequestError::Transport {
        reason: format!("invalid endpoint: {err}"),
        timed_out: false,
    }
}

#[async_trait]
impl StorefrontBackend for HttpStorefrontClient {
    async fn classify_image(
        &self,
        file: &ImageFile,
    ) -> Result<ClassificationResponse, RequestError> {
        let endpoint = self.classify_url().map_err(endpoint_error)?;
        let part = multipart::Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.media_type())
            .map_err(|err| RequestError::Transport {
                reason: format!("could not encode upload: {err}"),
                timed_out: false,
            })?;
        let form = multipart::Form::new().part(CLASSIFY_FILE_FIELD, part);
        self.send_multipart(endpoint, form).await
    }

    async fn update_cart_line(
        &self,
        line_id: LineId,
        quantity: u32,
    ) -> Result<CartUpdateResponse, RequestError> {
        let endpoint = self.cart_update_url(line_id).map_err(endpoint_error)?;
        self.send_json(endpoint, &CartUpdateRequest { quantity }).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
