use reqwest::{Client, Url};

use crate::error::{Error, Result};

use super::model::ConsumptionPage;

/// Thin client for the consumption endpoint. Authenticates with HTTP basic
/// auth where the API key is the username and the password is empty. One
/// outbound request per call, no retries; re-trying is the scheduler's job.
#[derive(Debug, Clone)]
pub struct ConsumptionClient {
    client: Client,
    api_key: String,
}

impl ConsumptionClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    pub async fn fetch(&self, url: Url) -> Result<ConsumptionPage> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.api_key, None::<&str>)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(status));
        }

        response
            .json::<ConsumptionPage>()
            .await
            .map_err(|e| Error::Data(format!("undecodable consumption envelope: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(server: &mockito::ServerGuard) -> Url {
        Url::parse(&format!("{}/consumption/", server.url())).unwrap()
    }

    #[tokio::test]
    async fn fetches_and_parses_a_consumption_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/consumption/")
            .match_header("authorization", "Basic c2stdGVzdDo=")
            .with_body(r#"{"results": [{"consumption": 0.25}]}"#)
            .create_async()
            .await;

        let client = ConsumptionClient::new("sk-test");
        let page = client.fetch(url(&server)).await.unwrap();

        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].consumption, Some(0.25));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/consumption/")
            .with_status(500)
            .create_async()
            .await;

        let client = ConsumptionClient::new("sk-test");
        let error = client.fetch(url(&server)).await.unwrap_err();

        assert!(matches!(error, Error::Http(status) if status.as_u16() == 500));
    }

    #[tokio::test]
    async fn undecodable_body_is_a_data_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/consumption/")
            .with_body("not json")
            .create_async()
            .await;

        let client = ConsumptionClient::new("sk-test");
        let error = client.fetch(url(&server)).await.unwrap_err();

        assert!(matches!(error, Error::Data(_)));
    }

    #[tokio::test]
    async fn missing_results_list_is_an_empty_page() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/consumption/")
            .with_body(r#"{"count": 0}"#)
            .create_async()
            .await;

        let client = ConsumptionClient::new("sk-test");
        let page = client.fetch(url(&server)).await.unwrap();

        assert!(page.results.is_empty());
    }
}
