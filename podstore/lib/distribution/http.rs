use std::sync::Arc;

use bytes::Bytes;
use oci_spec::image::ImageManifest;
use reqwest::{
    header::{ACCEPT, AUTHORIZATION, WWW_AUTHENTICATE},
    Client, RequestBuilder, StatusCode,
};
use serde::Deserialize;

use crate::{oci::Image, PodstoreError, PodstoreResult};

use super::{BearerChallenge, CredentialProvider, ManifestSource, RegistryTransport};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The MIME type for Docker Registry v2 manifests.
const DOCKER_MANIFEST_MIME_TYPE: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// The MIME type for OCI image manifests.
const OCI_MANIFEST_MIME_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

/// The MIME type for Docker image configuration blobs.
const DOCKER_CONFIG_MIME_TYPE: &str = "application/vnd.docker.container.image.v1+json";

/// The MIME type for OCI image configuration blobs.
const OCI_CONFIG_MIME_TYPE: &str = "application/vnd.oci.image.config.v1+json";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A client for the registry HTTP API v2 that follows the Docker token authentication flow.
///
/// Requests are sent once. Transient failures are returned to the caller as they happen.
///
/// [Docker Registry API]: https://distribution.github.io/distribution/spec/api/#introduction
#[derive(Clone)]
pub struct HttpRegistryClient {
    /// The HTTP client used to talk to registries and token endpoints.
    client: Client,

    /// Where manifest requests get their password from.
    credentials: Arc<dyn CredentialProvider>,
}

/// The body returned by a token endpoint. Registries fill either field, or both.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,

    #[serde(default)]
    access_token: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl HttpRegistryClient {
    /// Creates a client with a default HTTP client.
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::with_client(Client::new(), credentials)
    }

    /// Creates a client on top of an existing HTTP client.
    pub fn with_client(client: Client, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Exchanges a bearer challenge for a token, authenticating with basic auth when a user is set.
    async fn request_token(
        &self,
        challenge: &BearerChallenge,
        user: &str,
        password: &str,
    ) -> PodstoreResult<String> {
        let mut request = self
            .client
            .get(challenge.get_realm())
            .query(&challenge.token_query());
        if !user.is_empty() {
            request = request.basic_auth(user, Some(password));
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PodstoreError::AuthToken(format!("token request failed: {e}")))?;

        let body = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| PodstoreError::AuthToken(format!("invalid token response: {e}")))?;

        body.token
            .filter(|t| !t.is_empty())
            .or(body.access_token.filter(|t| !t.is_empty()))
            .map(|t| format!("Bearer {t}"))
            .ok_or_else(|| {
                PodstoreError::AuthToken(format!(
                    "no token returned by {}",
                    challenge.get_realm()
                ))
            })
    }

    async fn try_fetch_manifest(&self, image: &Image) -> PodstoreResult<ImageManifest> {
        let url = format!(
            "{}/manifests/{}",
            image.api_base(),
            image.get_reference().as_api_reference()
        );

        let (user, password) = match self.credentials.get_password(image).await {
            Ok(password) => (image.get_user().clone().unwrap_or_default(), password),
            Err(e) => {
                tracing::warn!(error = %e, "no credential for {image}, fetching manifest anonymously");
                (String::new(), String::new())
            }
        };

        let authorization = self.negotiate_token(&url, &user, &password).await?;
        let request = self.client.get(&url).header(
            ACCEPT,
            format!("{DOCKER_MANIFEST_MIME_TYPE}, {OCI_MANIFEST_MIME_TYPE}"),
        );

        let bytes = authorize(request, &authorization)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(serde_json::from_slice(&bytes)?)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait::async_trait]
impl RegistryTransport for HttpRegistryClient {
    async fn negotiate_token(
        &self,
        url: &str,
        user: &str,
        password: &str,
    ) -> PodstoreResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PodstoreError::AuthToken(format!("probing {url} failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(String::new());
        }

        if status != StatusCode::UNAUTHORIZED {
            return Err(PodstoreError::AuthToken(format!(
                "unexpected status {status} probing {url}"
            )));
        }

        let header = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                PodstoreError::AuthToken(format!("{url} requires auth but sent no challenge"))
            })?;

        let challenge = header.parse::<BearerChallenge>()?;
        tracing::debug!("token challenge for {url}: {challenge:?}");

        self.request_token(&challenge, user, password).await
    }

    async fn fetch_blob(&self, url: &str, authorization: &str) -> PodstoreResult<Bytes> {
        let request = self.client.get(url).header(
            ACCEPT,
            format!("{DOCKER_CONFIG_MIME_TYPE}, {OCI_CONFIG_MIME_TYPE}"),
        );

        let response = authorize(request, authorization)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?)
    }
}

#[async_trait::async_trait]
impl ManifestSource for HttpRegistryClient {
    async fn fetch_manifest(&self, image: &Image) -> PodstoreResult<ImageManifest> {
        self.try_fetch_manifest(image).await.map_err(|e| match e {
            PodstoreError::ManifestUnavailable(_) => e,
            other => PodstoreError::ManifestUnavailable(format!("{image}: {other}")),
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn authorize(request: RequestBuilder, authorization: &str) -> RequestBuilder {
    if authorization.is_empty() {
        request
    } else {
        request.header(AUTHORIZATION, authorization)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use base64::{engine::general_purpose::STANDARD, Engine};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use crate::{distribution::EnvCredentialProvider, oci::ImageReference};

    use super::*;

    type Requests = Arc<Mutex<Vec<String>>>;

    /// Binds a local registry stub. Returns its base URL and the listener to hand to [`serve`].
    async fn bind() -> anyhow::Result<(String, TcpListener)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok((format!("http://{}", listener.local_addr()?), listener))
    }

    /// Answers one connection per response, in order, recording every request head.
    fn serve(listener: TcpListener, responses: Vec<String>) -> Requests {
        let requests = Requests::default();
        let recorded = requests.clone();

        tokio::spawn(async move {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };

                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }

                recorded
                    .lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&head).into_owned());
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        requests
    }

    fn http_response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
        let mut response = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n",
            body.len()
        );
        for (name, value) in headers {
            response.push_str(&format!("{name}: {value}\r\n"));
        }
        response.push_str("\r\n");
        response.push_str(body);
        response
    }

    fn bearer_challenge(base: &str) -> String {
        format!(r#"Bearer realm="{base}/token",service="svc",scope="repository:app:pull""#)
    }

    fn client() -> anyhow::Result<HttpRegistryClient> {
        Ok(HttpRegistryClient::with_client(
            Client::builder().no_proxy().build()?,
            Arc::new(EnvCredentialProvider::new()),
        ))
    }

    fn authorization_header(request: &str) -> Option<String> {
        request
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
            .map(|(_, value)| value.trim().to_string())
    }

    #[test_log::test(tokio::test)]
    async fn test_negotiate_token_open_registry_needs_no_token() -> anyhow::Result<()> {
        let (base, listener) = bind().await?;
        let requests = serve(listener, vec![http_response("200 OK", &[], "{}")]);

        let token = client()?
            .negotiate_token(&format!("{base}/v2/app/blobs/sha256:cc"), "builder", "secret")
            .await?;

        assert_eq!(token, "");
        assert_eq!(requests.lock().unwrap().len(), 1);

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_negotiate_token_follows_bearer_challenge_with_basic_auth() -> anyhow::Result<()> {
        let (base, listener) = bind().await?;
        let challenge = bearer_challenge(&base);
        let requests = serve(
            listener,
            vec![
                http_response("401 Unauthorized", &[("WWW-Authenticate", challenge.as_str())], ""),
                http_response("200 OK", &[], r#"{"token":"abc","expires_in":300}"#),
            ],
        );

        let token = client()?
            .negotiate_token(&format!("{base}/v2/app/blobs/sha256:cc"), "builder", "secret")
            .await?;

        assert_eq!(token, "Bearer abc");

        let requests = requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].starts_with("GET /v2/app/blobs/sha256:cc "));
        assert!(
            requests[1].starts_with("GET /token?service=svc&scope=repository%3Aapp%3Apull "),
            "unexpected token request: {}",
            requests[1]
        );
        assert_eq!(
            authorization_header(&requests[1]),
            Some(format!("Basic {}", STANDARD.encode("builder:secret")))
        );

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_negotiate_token_anonymous_uses_access_token_when_token_is_empty(
    ) -> anyhow::Result<()> {
        let (base, listener) = bind().await?;
        let challenge = bearer_challenge(&base);
        let requests = serve(
            listener,
            vec![
                http_response("401 Unauthorized", &[("WWW-Authenticate", challenge.as_str())], ""),
                http_response("200 OK", &[], r#"{"token":"","access_token":"xyz"}"#),
            ],
        );

        let token = client()?
            .negotiate_token(&format!("{base}/v2/app/blobs/sha256:cc"), "", "")
            .await?;

        assert_eq!(token, "Bearer xyz");
        assert_eq!(authorization_header(&requests.lock().unwrap()[1]), None);

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_negotiate_token_empty_token_response_fails() -> anyhow::Result<()> {
        let (base, listener) = bind().await?;
        let challenge = bearer_challenge(&base);
        serve(
            listener,
            vec![
                http_response("401 Unauthorized", &[("WWW-Authenticate", challenge.as_str())], ""),
                http_response("200 OK", &[], r#"{"token":""}"#),
            ],
        );

        let result = client()?
            .negotiate_token(&format!("{base}/v2/app/blobs/sha256:cc"), "", "")
            .await;

        assert!(matches!(result, Err(PodstoreError::AuthToken(_))));
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_negotiate_token_rejects_unexpected_status() -> anyhow::Result<()> {
        let (base, listener) = bind().await?;
        let requests = serve(listener, vec![http_response("403 Forbidden", &[], "")]);

        let result = client()?
            .negotiate_token(&format!("{base}/v2/app/blobs/sha256:cc"), "builder", "secret")
            .await;

        assert!(matches!(result, Err(PodstoreError::AuthToken(_))));
        assert_eq!(requests.lock().unwrap().len(), 1);

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_negotiate_token_requires_challenge_on_unauthorized() -> anyhow::Result<()> {
        let (base, listener) = bind().await?;
        let requests = serve(listener, vec![http_response("401 Unauthorized", &[], "")]);

        let result = client()?
            .negotiate_token(&format!("{base}/v2/app/blobs/sha256:cc"), "builder", "secret")
            .await;

        assert!(matches!(result, Err(PodstoreError::AuthToken(_))));
        assert_eq!(requests.lock().unwrap().len(), 1);

        Ok(())
    }

    #[test]
    fn test_token_response_accepts_either_field() -> anyhow::Result<()> {
        let docker: TokenResponse = serde_json::from_str(r#"{"token":"abc","expires_in":300}"#)?;
        assert_eq!(docker.token.as_deref(), Some("abc"));

        let oauth: TokenResponse = serde_json::from_str(r#"{"access_token":"xyz"}"#)?;
        assert_eq!(oauth.token, None);
        assert_eq!(oauth.access_token.as_deref(), Some("xyz"));

        Ok(())
    }

    #[test_log::test(tokio::test)]
    #[ignore = "requires Docker registry access"]
    async fn test_http_registry_client_fetches_alpine_manifest_and_config() -> anyhow::Result<()> {
        let client = HttpRegistryClient::new(Arc::new(EnvCredentialProvider::new()));
        let image = Image::new(
            "registry-1.docker.io",
            "library/alpine",
            ImageReference::tag("latest"),
        );

        let manifest = client.fetch_manifest(&image).await?;
        assert!(!manifest.layers().is_empty());

        let url = format!("{}/blobs/{}", image.api_base(), manifest.config().digest());
        let token = client.negotiate_token(&url, "", "").await?;
        assert!(token.starts_with("Bearer "));

        let config = client.fetch_blob(&url, &token).await?;
        let config: serde_json::Value = serde_json::from_slice(&config)?;
        assert!(config.get("rootfs").is_some());

        Ok(())
    }
}
