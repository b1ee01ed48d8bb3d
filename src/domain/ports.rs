use crate::utils::error::Result;
use async_trait::async_trait;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn problems_file(&self) -> &str;
    fn time_limit(&self) -> Duration;
}

/// A request handler. Redirect resolvers wrap another handler as their fallback.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, req: Request<Bytes>) -> Response<Full<Bytes>>;
}
