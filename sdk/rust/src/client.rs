use reqwest::header::HeaderValue;
use reqwest::{Client, IntoUrl, Method, Request, RequestBuilder, Response};
use url::{Position, Url};

/// Header carrying the real destination origin.
pub const X_PROXY_TARGET: &str = "x-proxy-target";
/// Header carrying the gateway shared secret.
pub const X_PROXY_AUTH: &str = "x-proxy-auth";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid gateway url: {0}")]
    GatewayUrl(String),

    #[error("request url has no host: {0}")]
    MissingHost(String),

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Client that sends every request through a forwarding gateway.
///
/// The original `scheme://host[:port]` of each request moves into the
/// `X-Proxy-Target` header and the request itself is re-addressed to the
/// gateway, keeping path and query.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    gateway: Url,
    secret: String,
}

impl GatewayClient {
    pub fn new(gateway_url: &str, secret: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), gateway_url, secret)
    }

    /// Wrap an existing reqwest client (custom timeouts, no_proxy, ...).
    pub fn with_client(client: Client, gateway_url: &str, secret: &str) -> Result<Self, ClientError> {
        let gateway = Url::parse(gateway_url)
            .map_err(|e| ClientError::GatewayUrl(format!("{}: {}", gateway_url, e)))?;
        if gateway.host_str().is_none() {
            return Err(ClientError::GatewayUrl(format!("{}: missing host", gateway_url)));
        }

        Ok(Self {
            client,
            gateway,
            secret: secret.to_string(),
        })
    }

    pub fn gateway(&self) -> &Url {
        &self.gateway
    }

    /// Start a request addressed to the real destination.
    ///
    /// Send it with [`GatewayClient::send`] so it gets routed through the gateway.
    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.client.request(method, url)
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Build, prepare and execute a request.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let request = builder.build()?;
        self.execute(request).await
    }

    /// Prepare and execute an already built request.
    pub async fn execute(&self, mut request: Request) -> Result<Response, ClientError> {
        self.prepare(&mut request)?;
        Ok(self.client.execute(request).await?)
    }

    /// Rewrite a request in place for the gateway.
    pub fn prepare(&self, request: &mut Request) -> Result<(), ClientError> {
        let original = request.url().clone();
        if original.host_str().is_none() {
            return Err(ClientError::MissingHost(original.to_string()));
        }

        let origin = format!("{}://{}", original.scheme(), authority(&original));
        let rewritten = format!(
            "{}://{}{}",
            self.gateway.scheme(),
            authority(&self.gateway),
            &original[Position::BeforePath..]
        );
        *request.url_mut() = Url::parse(&rewritten)
            .map_err(|e| ClientError::GatewayUrl(format!("{}: {}", rewritten, e)))?;

        let headers = request.headers_mut();
        headers.insert(X_PROXY_TARGET, HeaderValue::from_str(&origin)?);
        headers.insert(X_PROXY_AUTH, HeaderValue::from_str(&self.secret)?);
        Ok(())
    }
}

fn authority(url: &Url) -> &str {
    &url[Position::BeforeHost..Position::AfterPort]
}
