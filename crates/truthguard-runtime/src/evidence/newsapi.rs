//! NewsAPI-compatible `/everything` search restricted to trusted domains.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use truthguard_core::{search_query, Evidence, EvidenceArticle, Scope};

use super::EvidenceRetriever;
use crate::config::SearchSettings;
use crate::providers::ApiCredential;

/// Environment variable holding the search API key.
pub const NEWS_API_KEY_ENV: &str = "NEWS_API_KEY";

/// Placeholder title NewsAPI uses for withdrawn articles.
const REMOVED_TITLE: &str = "[Removed]";

/// Evidence retriever backed by NewsAPI.
pub struct NewsApiRetriever {
    credential: Option<ApiCredential>,
    settings: SearchSettings,
    client: Client,
}

impl std::fmt::Debug for NewsApiRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApiRetriever")
            .field("credential", &self.credential)
            .field("base_url", &self.settings.base_url)
            .finish()
    }
}

impl NewsApiRetriever {
    /// Create a retriever; `None` means every lookup reports a missing credential.
    pub fn new(credential: Option<ApiCredential>, settings: SearchSettings) -> Self {
        Self {
            credential,
            settings,
            client: Client::new(),
        }
    }

    /// Create a retriever with the key read from `NEWS_API_KEY`.
    pub fn from_env(settings: SearchSettings) -> Self {
        let credential = ApiCredential::from_env_optional(NEWS_API_KEY_ENV, "NewsAPI key");
        if credential.is_none() {
            tracing::warn!(
                env = NEWS_API_KEY_ENV,
                "No search credential; evidence will be reported as missing"
            );
        }
        Self::new(credential, settings)
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    fn everything_url(&self) -> String {
        format!("{}/everything", self.settings.base_url.trim_end_matches('/'))
    }

    async fn search(
        &self,
        credential: &ApiCredential,
        query: &str,
        scope: Scope,
    ) -> Result<Vec<EvidenceArticle>, reqwest::Error> {
        let domains = self.settings.domains(scope).join(",");
        let page_size = self.settings.page_size.to_string();

        let body: SearchResponse = self
            .client
            .get(self.everything_url())
            .header("X-Api-Key", credential.expose())
            .query(&[
                ("q", query),
                ("domains", domains.as_str()),
                ("sortBy", "relevancy"),
                ("pageSize", page_size.as_str()),
            ])
            .timeout(self.settings.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body
            .articles
            .into_iter()
            .filter_map(|article| {
                let title = article.title.filter(|t| !t.trim().is_empty() && t != REMOVED_TITLE)?;
                let source = article
                    .source
                    .and_then(|s| s.name)
                    .unwrap_or_else(|| "Unknown".to_string());
                Some(EvidenceArticle::new(source, title))
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    source: Option<ArticleSource>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    #[serde(default)]
    name: Option<String>,
}

#[async_trait]
impl EvidenceRetriever for NewsApiRetriever {
    async fn retrieve(&self, title: &str, scope: Scope) -> Evidence {
        let Some(credential) = &self.credential else {
            return Evidence::MissingCredential;
        };

        let query = search_query(title, self.settings.query_words);
        if query.is_empty() {
            tracing::debug!(title, "Claim has no searchable words");
            return Evidence::NoMatch;
        }

        match self.search(credential, &query, scope).await {
            Ok(articles) => {
                tracing::debug!(%scope, query, found = articles.len(), "Evidence search finished");
                Evidence::from_articles(articles)
            }
            Err(e) => {
                tracing::warn!(%scope, query, error = %e, "Evidence search failed");
                Evidence::SearchUnavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::CredentialSource;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> SearchSettings {
        SearchSettings {
            base_url: server.uri(),
            timeout: Duration::from_millis(500),
            ..SearchSettings::default()
        }
    }

    fn retriever(server: &MockServer) -> NewsApiRetriever {
        let key = ApiCredential::new("news-key", CredentialSource::Programmatic, "NewsAPI key");
        NewsApiRetriever::new(Some(key), settings(server))
    }

    #[tokio::test]
    async fn test_found_articles_are_joined_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/everything"))
            .and(header("X-Api-Key", "news-key"))
            .and(query_param("q", "Government announces free electricity for all"))
            .and(query_param("sortBy", "relevancy"))
            .and(query_param("pageSize", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok",
                "articles": [
                    { "source": { "name": "Kathmandu Post" }, "title": "No plan for free power, says NEA" },
                    { "source": { "name": "Reuters" }, "title": "Nepal power tariffs unchanged" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let evidence = retriever(&server)
            .retrieve("Government announces free electricity for all households!", Scope::Local)
            .await;

        assert_eq!(
            evidence.render(),
            "[Kathmandu Post] No plan for free power, says NEA | [Reuters] Nepal power tariffs unchanged"
        );
    }

    #[tokio::test]
    async fn test_domains_follow_scope() {
        let server = MockServer::start().await;
        let expected = SearchSettings::default().global_domains.join(",");
        Mock::given(method("GET"))
            .and(query_param("domains", expected.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "articles": [{ "source": { "name": "AP" }, "title": "Summit ends" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let evidence = retriever(&server).retrieve("World leaders meet at summit", Scope::Global).await;
        assert!(!evidence.is_sentinel());
    }

    #[tokio::test]
    async fn test_empty_or_removed_results_are_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok",
                "articles": [{ "source": { "name": null }, "title": "[Removed]" }]
            })))
            .mount(&server)
            .await;

        let evidence = retriever(&server).retrieve("Some unreported rumour here", Scope::Local).await;
        assert_eq!(evidence, Evidence::NoMatch);
    }

    #[tokio::test]
    async fn test_http_failure_is_search_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(426))
            .mount(&server)
            .await;

        let evidence = retriever(&server).retrieve("Some claim text", Scope::Local).await;
        assert_eq!(evidence, Evidence::SearchUnavailable);
    }

    #[tokio::test]
    async fn test_malformed_body_is_search_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>quota</html>"))
            .mount(&server)
            .await;

        let evidence = retriever(&server).retrieve("Some claim text", Scope::Local).await;
        assert_eq!(evidence, Evidence::SearchUnavailable);
    }

    #[tokio::test]
    async fn test_timeout_is_search_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "articles": [] }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let evidence = retriever(&server).retrieve("Some claim text", Scope::Local).await;
        assert_eq!(evidence, Evidence::SearchUnavailable);
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let retriever = NewsApiRetriever::new(None, settings(&server));
        assert!(!retriever.has_credential());
        assert_eq!(
            retriever.retrieve("Any claim at all", Scope::Global).await,
            Evidence::MissingCredential
        );
    }
}
