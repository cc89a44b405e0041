//! HTTP surface: status codes and the structured error payload

#[cfg(test)]
mod tests {
    use crate::{
        api::create_router,
        tests::support::{setup, snapshot, MockIndexer, TestStack, BUYER, OWNER},
    };
    use reqwest::{Client, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    struct Server {
        base: String,
        client: Client,
    }

    impl Server {
        async fn get(&self, path: &str) -> (StatusCode, Option<String>, Value) {
            let response = self.client.get(format!("{}{}", self.base, path)).send().await.unwrap();
            Self::read(response).await
        }

        async fn put_json(&self, path: &str, body: &Value) -> (StatusCode, Option<String>, Value) {
            let response = self
                .client
                .put(format!("{}{}", self.base, path))
                .json(body)
                .send()
                .await
                .unwrap();
            Self::read(response).await
        }

        async fn put_raw(&self, path: &str, body: &'static str) -> (StatusCode, Option<String>, Value) {
            let response = self
                .client
                .put(format!("{}{}", self.base, path))
                .header("content-type", "application/json")
                .body(body)
                .send()
                .await
                .unwrap();
            Self::read(response).await
        }

        async fn read(response: reqwest::Response) -> (StatusCode, Option<String>, Value) {
            let status = response.status();
            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let text = response.text().await.unwrap();
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            (status, content_type, body)
        }
    }

    /// Serve the router on an ephemeral port, handing back the scripted indexer
    async fn serve(stack: TestStack) -> (Server, Arc<MockIndexer>) {
        let TestStack { state, indexer, .. } = stack;
        let app = create_router(Arc::new(state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder().no_proxy().build().unwrap();
        (Server { base: format!("http://{}", addr), client }, indexer)
    }

    fn assert_invalid_parameter(status: StatusCode, content_type: Option<String>, body: &Value) {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(content_type.unwrap_or_default().starts_with("application/json"));
        assert_eq!(body["kind"], "invalid_parameter");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_non_numeric_chain_is_structured_error() {
        let (server, _indexer) = serve(setup().await).await;

        let (status, content_type, body) = server.get("/projects/abc/1").await;
        assert_invalid_parameter(status, content_type, &body);
        assert!(body["message"].as_str().unwrap().contains("chain"));
    }

    #[tokio::test]
    async fn test_non_numeric_project_id_is_structured_error() {
        let (server, _indexer) = serve(setup().await).await;

        let (status, content_type, body) = server.get("/projects/8453/-5").await;
        assert_invalid_parameter(status, content_type, &body);

        let (status, content_type, body) = server.put_json(&format!("/users/8453/{}/favorites/x", BUYER), &json!({})).await;
        assert_invalid_parameter(status, content_type, &body);
    }

    #[tokio::test]
    async fn test_malformed_query_numbers_are_structured_errors() {
        let (server, _indexer) = serve(setup().await).await;

        let (status, content_type, body) = server.get("/projects/8453/1/incomes?limit=lots").await;
        assert_invalid_parameter(status, content_type, &body);

        let (status, content_type, body) = server.get(&format!("/users/8453/{}/favorites?page=-1", BUYER)).await;
        assert_invalid_parameter(status, content_type, &body);
    }

    #[tokio::test]
    async fn test_missing_statistic_params_are_structured_errors() {
        let (server, _indexer) = serve(setup().await).await;

        let (status, content_type, body) = server.get("/projects/8453/1/statistics?gap=week").await;
        assert_invalid_parameter(status, content_type, &body);
        assert!(body["message"].as_str().unwrap().contains("metric"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_structured_error() {
        let (server, indexer) = serve(setup().await).await;
        indexer.set_project(snapshot(1, OWNER, false, 100));

        let (status, content_type, body) = server.put_raw("/projects/8453/1/avatar", "{\"url\":").await;
        assert_invalid_parameter(status, content_type, &body);
    }

    #[tokio::test]
    async fn test_unknown_project_is_not_found() {
        let (server, _indexer) = serve(setup().await).await;

        let (status, _, body) = server.get("/projects/8453/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_indexer_outage_hides_detail() {
        let (server, indexer) = serve(setup().await).await;
        indexer.set_failing(true);

        let (status, _, body) = server.get("/projects/8453/1").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "upstream_unavailable");
        assert!(!body.to_string().contains("indexer offline"));
    }

    #[tokio::test]
    async fn test_project_and_favorite_round_trip() {
        let (server, indexer) = serve(setup().await).await;
        indexer.set_project(snapshot(1, OWNER, false, 100));

        let (status, _, body) = server.get("/projects/8453/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["projectId"], 1);
        assert_eq!(body["data"]["owner"], OWNER);

        let path = format!("/users/8453/{}/favorites/1", BUYER);
        let (created, _, body) = server.put_json(&path, &json!({})).await;
        assert_eq!(created, StatusCode::CREATED);
        assert_eq!(body["data"]["changed"], true);

        let (again, _, body) = server.put_json(&path, &json!({})).await;
        assert_eq!(again, StatusCode::OK);
        assert_eq!(body["data"]["changed"], false);
    }
}
