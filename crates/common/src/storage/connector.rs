//! HTTP transport for the S3 SDK backed by reqwest.
//!
//! The SDK's bundled connector always verifies certificates. Grids running
//!  with self-signed certificates need that switched off, which reqwest
//!  supports directly, so requests are handed over to a reqwest client.

use aws_smithy_runtime_api::client::http::{
    HttpClient, HttpConnector, HttpConnectorFuture, HttpConnectorSettings, SharedHttpConnector,
};
use aws_smithy_runtime_api::client::orchestrator::{HttpRequest, HttpResponse};
use aws_smithy_runtime_api::client::result::ConnectorError;
use aws_smithy_runtime_api::client::runtime_components::RuntimeComponents;
use aws_smithy_runtime_api::http::StatusCode;
use aws_smithy_types::body::SdkBody;
use reqwest::{Client, Method};

#[derive(Debug, Clone)]
pub(crate) struct ReqwestConnector {
    client: Client,
}

impl ReqwestConnector {
    pub(crate) fn new(skip_tls_verify: bool, timeout: std::time::Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .danger_accept_invalid_certs(skip_tls_verify)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl HttpConnector for ReqwestConnector {
    fn call(&self, request: HttpRequest) -> HttpConnectorFuture {
        let client = self.client.clone();

        HttpConnectorFuture::new(async move {
            let method = Method::from_bytes(request.method().as_bytes())
                .map_err(|e| ConnectorError::other(e.into(), None))?;

            let mut builder = client.request(method, request.uri());
            for (name, value) in request.headers().iter() {
                builder = builder.header(name, value);
            }
            let body = request.body().bytes().map(<[u8]>::to_vec).unwrap_or_default();

            let response = builder
                .body(body)
                .send()
                .await
                .map_err(|e| ConnectorError::io(e.into()))?;

            let status = StatusCode::try_from(response.status().as_u16())
                .map_err(|e| ConnectorError::other(e.into(), None))?;
            let headers = response.headers().clone();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ConnectorError::io(e.into()))?;

            let mut sdk_response = HttpResponse::new(status, SdkBody::from(bytes));
            for (name, value) in headers.iter() {
                if let Ok(value) = value.to_str() {
                    sdk_response
                        .headers_mut()
                        .append(name.as_str().to_owned(), value.to_owned());
                }
            }

            Ok(sdk_response)
        })
    }
}

impl HttpClient for ReqwestConnector {
    fn http_connector(
        &self,
        _settings: &HttpConnectorSettings,
        _components: &RuntimeComponents,
    ) -> SharedHttpConnector {
        SharedHttpConnector::new(self.clone())
    }
}
