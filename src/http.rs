//! Single-shot HTTP calls with an optional IP family constraint.

use crate::error::Result;
use async_trait::async_trait;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP methods used against the echo endpoint and LiveDNS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// IP family the outbound connection is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpVersion {
    #[default]
    Any,
    V4,
    V6,
}

impl IpVersion {
    /// Whether an address belongs to this family.
    pub fn accepts(self, ip: IpAddr) -> bool {
        match self {
            IpVersion::Any => true,
            IpVersion::V4 => ip.is_ipv4(),
            IpVersion::V6 => ip.is_ipv6(),
        }
    }

    /// Local bind address that pins the socket to this family.
    fn local_address(self) -> Option<IpAddr> {
        match self {
            IpVersion::Any => None,
            IpVersion::V4 => Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            IpVersion::V6 => Some(IpAddr::V6(Ipv6Addr::UNSPECIFIED)),
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::Any => write!(f, "any"),
            IpVersion::V4 => write!(f, "IPv4"),
            IpVersion::V6 => write!(f, "IPv6"),
        }
    }
}

/// One outbound HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub url: String,
    pub method: Method,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
    pub ip_version: IpVersion,
}

impl ApiRequest {
    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            body: None,
            headers: Vec::new(),
            ip_version: IpVersion::Any,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add an `Authorization: Bearer` header.
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn ip_version(mut self, version: IpVersion) -> Self {
        self.ip_version = version;
        self
    }
}

/// Status code and trimmed body of a completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCallResult {
    pub status: u16,
    pub body: String,
}

impl ApiCallResult {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Capability to perform a single HTTP round trip.
///
/// Implementations never treat an HTTP status as a failure; only transport
/// problems come back as `Err`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpCaller: Send + Sync {
    async fn call(&self, request: ApiRequest) -> Result<ApiCallResult>;
}

/// [`HttpCaller`] backed by reqwest, with a fresh client per call.
pub struct ReqwestCaller {
    timeout: Duration,
}

impl ReqwestCaller {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn client_for(&self, version: IpVersion) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        if version != IpVersion::Any {
            builder = builder
                .local_address(version.local_address())
                .dns_resolver(Arc::new(FamilyResolver { version }));
        }
        Ok(builder.build()?)
    }
}

impl Default for ReqwestCaller {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpCaller for ReqwestCaller {
    async fn call(&self, request: ApiRequest) -> Result<ApiCallResult> {
        let client = self.client_for(request.ip_version)?;

        let mut builder = client.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.method == Method::Post {
            if let Some(body) = request.body.filter(|b| !b.is_empty()) {
                builder = builder.body(body);
            }
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::trace!("{:?} {} -> {}", request.method, request.url, status);

        Ok(ApiCallResult::new(status, body.trim()))
    }
}

/// Resolver that only hands out addresses of one family.
struct FamilyResolver {
    version: IpVersion,
}

impl Resolve for FamilyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(lookup_family(name.as_str().to_string(), self.version))
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn lookup_family(host: String, version: IpVersion) -> std::result::Result<Addrs, BoxError> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
        .await?
        .filter(|addr| version.accepts(addr.ip()))
        .collect();

    if addrs.is_empty() {
        return Err(format!("no {} address found for {}", version, host).into());
    }

    Ok(Box::new(addrs.into_iter()))
}
