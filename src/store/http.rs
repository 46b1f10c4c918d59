//! S3-style HTTP gateway backend.
//!
//! Objects live at `{endpoint}/{container}/{key}`. Metadata comes from a
//! HEAD request (with a one-byte range request as fallback for gateways
//! that omit Content-Length from HEAD responses), ranges from GET with a
//! `Range` header, uploads from PUT with a streamed body, and listing from
//! the ListObjectsV2-style `?list-type=2` query.

use crate::error::{Error, Result};
use crate::store::{ByteStream, ObjectMeta, ObjectRef, ObjectStore};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, RANGE};
use reqwest::{StatusCode, Url};
use reqwest_middleware::ClientWithMiddleware;
use tracing::debug;

/// Object store backend speaking S3-style HTTP to a gateway endpoint.
///
/// The client handle is expected to be fully configured (credentials,
/// retries, proxy); see [`crate::http::create_http_client`].
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: ClientWithMiddleware,
    endpoint: Url,
}

impl HttpObjectStore {
    /// Create a store over an already-authenticated client and a base
    /// endpoint URL.
    pub fn new(client: ClientWithMiddleware, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    fn object_url(&self, object: &ObjectRef) -> Result<Url> {
        let raw = format!(
            "{}/{}/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            object.container,
            object.key
        );
        Url::parse(&raw).map_err(|e| Error::Configuration(format!("invalid object URL {raw}: {e}")))
    }

    fn container_url(&self, container: &str) -> Result<Url> {
        let raw = format!(
            "{}/{}?list-type=2",
            self.endpoint.as_str().trim_end_matches('/'),
            container
        );
        Url::parse(&raw)
            .map_err(|e| Error::Configuration(format!("invalid container URL {raw}: {e}")))
    }

    fn not_found(object: &ObjectRef) -> Error {
        Error::NotFound {
            container: object.container.clone(),
            key: object.key.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn metadata(&self, object: &ObjectRef) -> Result<ObjectMeta> {
        let url = self.object_url(object)?;
        let res = self.client.head(url.clone()).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Err(Self::not_found(object));
        }
        let res = res
            .error_for_status()
            .map_err(|e| Error::transfer_with(format!("metadata request for {object}"), e))?;

        if let Some(size) = res.content_length() {
            return Ok(ObjectMeta { size });
        }

        // Some gateways omit Content-Length from HEAD responses; a one-byte
        // range request always carries the total in Content-Range.
        debug!("HEAD for {} had no Content-Length, probing with a range", object);
        let res = self
            .client
            .get(url)
            .header(RANGE, "bytes=0-0")
            .send()
            .await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Err(Self::not_found(object));
        }
        res.headers()
            .get("Content-Range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .map(|size| ObjectMeta { size })
            .ok_or_else(|| Error::transfer(format!("could not determine size of {object}")))
    }

    async fn get_range(&self, object: &ObjectRef, start: u64, end: Option<u64>) -> Result<Bytes> {
        let url = self.object_url(object)?;
        let range = match end {
            Some(end) => format!("bytes={start}-{end}"),
            None => format!("bytes={start}-"),
        };
        let res = self.client.get(url).header(RANGE, &range).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Err(Self::not_found(object));
        }
        let res = res
            .error_for_status()
            .map_err(|e| Error::transfer_with(format!("range fetch {range} of {object}"), e))?;
        Ok(res.bytes().await?)
    }

    async fn put_stream(
        &self,
        object: &ObjectRef,
        body: ByteStream,
        size_hint: Option<u64>,
    ) -> Result<()> {
        let url = self.object_url(object)?;
        let mut req = self
            .client
            .put(url)
            .body(reqwest::Body::wrap_stream(body));
        if let Some(size) = size_hint {
            req = req.header(CONTENT_LENGTH, size);
        }
        let res = req.send().await?;
        res.error_for_status()
            .map_err(|e| Error::transfer_with(format!("upload of {object}"), e))?;
        Ok(())
    }

    async fn delete(&self, object: &ObjectRef) -> Result<()> {
        let url = self.object_url(object)?;
        let res = self.client.delete(url).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Err(Self::not_found(object));
        }
        res.error_for_status()
            .map_err(|e| Error::transfer_with(format!("delete of {object}"), e))?;
        Ok(())
    }

    async fn list_keys(&self, container: &str, suffix: &str) -> Result<Vec<String>> {
        let url = self.container_url(container)?;
        let res = self.client.get(url).send().await?;
        let res = res
            .error_for_status()
            .map_err(|e| Error::transfer_with(format!("listing of {container}"), e))?;
        let text = res.text().await?;
        Ok(extract_listed_keys(&text)
            .into_iter()
            .filter(|k| k.ends_with(suffix))
            .collect())
    }
}

/// Parse a `Content-Range` header value to extract the total size.
///
/// The header format is `bytes start-end/total`.
fn parse_content_range_total(content_range: &str) -> Option<u64> {
    content_range
        .split('/')
        .next_back()
        .and_then(|size| size.trim().parse::<u64>().ok())
}

/// Pull the `<Key>` values out of a ListObjectsV2-style XML body, in
/// listing order.
fn extract_listed_keys(body: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut rest = body;
    while let Some(open) = rest.find("<Key>") {
        rest = &rest[open + "<Key>".len()..];
        let Some(close) = rest.find("</Key>") else {
            break;
        };
        keys.push(rest[..close].to_string());
        rest = &rest[close + "</Key>".len()..];
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{create_http_client, HttpClientConfig};

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("bytes 0-1023/2048"), Some(2048));
        assert_eq!(parse_content_range_total("bytes 0-0/1"), Some(1));
        assert_eq!(parse_content_range_total("bytes 0-1023/ 2048 "), Some(2048));
        assert_eq!(parse_content_range_total("invalid"), None);
        assert_eq!(parse_content_range_total("bytes 0-1023"), None);
        assert_eq!(parse_content_range_total(""), None);
    }

    #[test]
    fn test_extract_listed_keys() {
        let body = "<ListBucketResult>\
            <Contents><Key>a.zip</Key><Size>10</Size></Contents>\
            <Contents><Key>notes.txt</Key><Size>3</Size></Contents>\
            <Contents><Key>b.zip</Key><Size>20</Size></Contents>\
            </ListBucketResult>";
        assert_eq!(
            extract_listed_keys(body),
            vec!["a.zip", "notes.txt", "b.zip"]
        );
    }

    #[test]
    fn test_extract_listed_keys_truncated() {
        assert_eq!(extract_listed_keys("<Key>a.zip"), Vec::<String>::new());
        assert_eq!(extract_listed_keys(""), Vec::<String>::new());
    }

    #[test]
    fn test_object_url_layout() {
        let client = create_http_client(HttpClientConfig::default()).unwrap();
        let store = HttpObjectStore::new(client, Url::parse("http://localhost:9000/").unwrap());
        let url = store
            .object_url(&ObjectRef::new("bucket", "dir/a.zip"))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/bucket/dir/a.zip");
    }
}
