//! GraphQL content API source

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::{Backing, ContentSource};
use crate::config::ContentApiConfig;
use crate::content::{parse_date_string, ListingQuery, Post, PostSummary};
use crate::error::ContentError;

const SOURCE_NAME: &str = "graphql";

const SLUGS_QUERY: &str = "query AllSlugs { posts(orderBy: slug_ASC) { slug } }";

const POST_QUERY: &str = r#"query PostBySlug($slug: String!) {
  post(where: { slug: $slug }) {
    slug title date excerpt category tags
    coverImage { url }
    body { markdown }
  }
}"#;

const POSTS_QUERY: &str = r#"query AllPosts {
  posts(orderBy: date_DESC) {
    slug title date excerpt category
    coverImage { url }
  }
}"#;

/// Posts served by a headless CMS over GraphQL
pub struct GraphSource {
    client: Client,
    endpoint: String,
    token: Option<String>,
    timeout: Duration,
    /// Caps in-flight requests to the API
    permits: Semaphore,
}

impl GraphSource {
    pub fn new(
        endpoint: &str,
        token: Option<String>,
        timeout: Duration,
        max_concurrency: usize,
    ) -> Result<Self, ContentError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ContentError::unavailable(SOURCE_NAME, e))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            token,
            timeout,
            permits: Semaphore::new(max_concurrency.max(1)),
        })
    }

    /// Build from config; `None` when no endpoint is configured
    pub fn from_config(config: &ContentApiConfig) -> Result<Option<Self>, ContentError> {
        let Some(endpoint) = &config.endpoint else {
            return Ok(None);
        };

        let token = std::env::var(&config.token_env).ok().filter(|t| !t.is_empty());
        if token.is_none() {
            tracing::warn!(
                "{} is not set, querying {} without authorization",
                config.token_env,
                endpoint
            );
        }

        Self::new(
            endpoint,
            token,
            Duration::from_secs(config.timeout_secs),
            config.max_concurrency,
        )
        .map(Some)
    }

    /// Run one GraphQL query, single attempt
    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ContentError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| ContentError::unavailable(SOURCE_NAME, e))?;

        let body = serde_json::json!({ "query": query, "variables": variables });
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ContentError::unavailable(
                    SOURCE_NAME,
                    format!("timed out after {}ms", self.timeout.as_millis()),
                )
            } else {
                ContentError::unavailable(SOURCE_NAME, format!("request failed: {}", e))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ContentError::unavailable(
                SOURCE_NAME,
                format!("HTTP {}: {}", status.as_u16(), text.trim()),
            ));
        }

        let payload: GraphResponse<T> = resp.json().await.map_err(|e| {
            ContentError::unavailable(SOURCE_NAME, format!("undecodable response: {}", e))
        })?;

        payload.into_data()
    }
}

#[async_trait]
impl ContentSource for GraphSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn backing(&self) -> Backing {
        Backing::Api
    }

    async fn get_post_by_slug(&self, slug: &str) -> Result<Post, ContentError> {
        let data: PostData = self
            .query(POST_QUERY, serde_json::json!({ "slug": slug }))
            .await?;

        data.post
            .map(PostRecord::into_post)
            .ok_or_else(|| ContentError::NotFound {
                slug: slug.to_string(),
            })
    }

    async fn get_all_slugs(&self) -> Result<Vec<String>, ContentError> {
        let data: SlugsData = self.query(SLUGS_QUERY, serde_json::json!({})).await?;
        Ok(data.posts.into_iter().map(|p| p.slug).collect())
    }

    /// The API serves a single collection; `category` only filters records
    /// that carry one.
    async fn list_posts(&self, query: &ListingQuery) -> Result<Vec<PostSummary>, ContentError> {
        let data: PostsData = self.query(POSTS_QUERY, serde_json::json!({})).await?;
        let summaries = data
            .posts
            .into_iter()
            .filter(|p| match (&query.category, &p.category) {
                (Some(wanted), Some(actual)) => wanted == actual,
                _ => true,
            })
            .map(|p| p.into_post().summary())
            .collect();
        Ok(query.apply(summaries))
    }
}

#[derive(Debug, Deserialize)]
struct GraphResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphError>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

impl<T> GraphResponse<T> {
    fn into_data(self) -> Result<T, ContentError> {
        if !self.errors.is_empty() {
            let messages: Vec<_> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(ContentError::unavailable(SOURCE_NAME, messages.join("; ")));
        }
        self.data
            .ok_or_else(|| ContentError::unavailable(SOURCE_NAME, "response has no data"))
    }
}

#[derive(Debug, Deserialize)]
struct SlugsData {
    posts: Vec<SlugRecord>,
}

#[derive(Debug, Deserialize)]
struct SlugRecord {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct PostData {
    post: Option<PostRecord>,
}

#[derive(Debug, Deserialize)]
struct PostsData {
    posts: Vec<PostRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostRecord {
    slug: String,
    title: Option<String>,
    date: Option<String>,
    excerpt: Option<String>,
    category: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    cover_image: Option<AssetRecord>,
    body: Option<BodyRecord>,
}

#[derive(Debug, Deserialize)]
struct AssetRecord {
    url: String,
}

#[derive(Debug, Deserialize)]
struct BodyRecord {
    markdown: Option<String>,
}

impl PostRecord {
    fn into_post(self) -> Post {
        Post {
            slug: self.slug,
            title: self.title,
            body: self.body.and_then(|b| b.markdown),
            date: self.date.as_deref().and_then(parse_date_string),
            excerpt: self.excerpt,
            cover_image: self.cover_image.map(|a| a.url),
            category: self.category,
            tags: self.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve the same canned response to every connection
    async fn spawn_server(status: u16, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    read_request(&mut socket).await;
                    let response = format!(
                        "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{}/graphql", addr)
    }

    /// Read headers plus `Content-Length` bytes of body
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let Ok(n) = socket.read(&mut chunk).await else {
                return;
            };
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    return;
                }
            }
        }
    }

    fn source(endpoint: &str, timeout: Duration) -> GraphSource {
        GraphSource::new(endpoint, Some("token".to_string()), timeout, 2).unwrap()
    }

    #[tokio::test]
    async fn test_get_all_slugs() {
        let url = spawn_server(200, r#"{"data":{"posts":[{"slug":"a"},{"slug":"b"}]}}"#).await;
        let slugs = source(&url, Duration::from_secs(5))
            .get_all_slugs()
            .await
            .unwrap();
        assert_eq!(slugs, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_get_post_by_slug() {
        let url = spawn_server(
            200,
            r##"{"data":{"post":{"slug":"hello","title":"Hello","date":"2022-01-15","coverImage":null,"body":{"markdown":"# Hi"}}}}"##,
        )
        .await;
        let post = source(&url, Duration::from_secs(5))
            .get_post_by_slug("hello")
            .await
            .unwrap();
        assert_eq!(post.slug, "hello");
        assert_eq!(post.title.as_deref(), Some("Hello"));
        assert_eq!(post.body.as_deref(), Some("# Hi"));
        assert!(post.cover_image.is_none());
        assert!(post.date.is_some());
    }

    #[tokio::test]
    async fn test_null_post_is_not_found() {
        let url = spawn_server(200, r#"{"data":{"post":null}}"#).await;
        let err = source(&url, Duration::from_secs(5))
            .get_post_by_slug("ghost")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ContentError::NotFound {
                slug: "ghost".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_graphql_errors_are_unavailable() {
        let url = spawn_server(200, r#"{"data":null,"errors":[{"message":"boom"}]}"#).await;
        let err = source(&url, Duration::from_secs(5))
            .get_all_slugs()
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let url = spawn_server(500, r#"{"message":"down"}"#).await;
        let err = source(&url, Duration::from_secs(5))
            .get_all_slugs()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let err = source(
            &format!("http://{}/graphql", addr),
            Duration::from_millis(200),
        )
        .get_all_slugs()
        .await
        .unwrap_err();
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_list_posts_truncates() {
        let url = spawn_server(
            200,
            r#"{"data":{"posts":[
                {"slug":"c","title":"C","date":"2022-03-01"},
                {"slug":"b","title":"B","date":"2022-02-01"},
                {"slug":"a","title":"A","date":"2022-01-01"}
            ]}}"#,
        )
        .await;
        let listed = source(&url, Duration::from_secs(5))
            .list_posts(&ListingQuery::default().with_limit(2))
            .await
            .unwrap();
        let slugs: Vec<_> = listed.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c", "b"]);
    }

    #[test]
    fn test_from_config_without_endpoint() {
        let config = ContentApiConfig::default();
        assert!(GraphSource::from_config(&config).unwrap().is_none());
    }
}
