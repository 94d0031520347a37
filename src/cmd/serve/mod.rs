// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod error;
mod handlers;
pub mod server;

#[cfg(test)]
mod tests {
    use lexicards_core::error::Fallible;
    use portpicker::pick_unused_port;
    use reqwest::Client;
    use reqwest::StatusCode;
    use serde_json::Value;
    use serde_json::json;
    use tempfile::TempDir;
    use tempfile::tempdir;
    use tokio::spawn;

    use crate::cmd::open_engine;
    use crate::cmd::serve::server::ServerConfig;
    use crate::cmd::serve::server::start_server;
    use crate::config::AppConfig;
    use crate::utils::wait_for_server;

    const TEST_HOST: &str = "127.0.0.1";

    /// HTTP tests mix client and server errors.
    type TestResult = Result<(), Box<dyn std::error::Error>>;

    /// Start a server over a fresh database. The directory must outlive the
    /// test.
    async fn spawn_server() -> Fallible<(TempDir, String)> {
        let dir = tempdir()?;
        let port = pick_unused_port().unwrap();
        let engine = open_engine(&AppConfig::default(), Some(dir.path().join("cards.db")))?;
        let config = ServerConfig {
            host: TEST_HOST.to_string(),
            port,
            engine,
        };
        spawn(async move { start_server(config).await });
        wait_for_server(TEST_HOST, port).await?;
        Ok((dir, format!("http://{TEST_HOST}:{port}")))
    }

    #[test]
    fn test_open_engine_in_missing_directory() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("missing").join("cards.db");
        assert!(open_engine(&AppConfig::default(), Some(path)).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_e2e() -> TestResult {
        let (_dir, base) = spawn_server().await?;
        let client = Client::new();

        // Health check.
        let response = client.get(format!("{base}/health")).send().await?;
        assert!(response.status().is_success());

        // Create a card.
        let response = client
            .post(format!("{base}/cards?user=alice"))
            .json(&json!({
                "word": "Hund",
                "translation": "dog",
                "context": ["Der Hund bellt."]
            }))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let card: Value = response.json().await?;
        let id = card["id"].as_i64().unwrap();
        assert_eq!(card["word"], "Hund");
        assert_eq!(card["state"], "Learning");
        assert_eq!(card["reps"], 0);
        assert_eq!(card["context"], json!(["Der Hund bellt."]));

        // The new card is due.
        let response = client.get(format!("{base}/cards/due?user=alice")).send().await?;
        assert!(response.status().is_success());
        let due: Vec<Value> = response.json().await?;
        assert_eq!(due.len(), 1);
        assert_eq!(due[0]["id"], id);

        // Answer it.
        let response = client
            .post(format!("{base}/cards/{id}/answer?user=alice"))
            .json(&json!({ "rating": 3 }))
            .send()
            .await?;
        assert!(response.status().is_success());
        let answered: Value = response.json().await?;
        assert_eq!(answered["reps"], 1);
        assert_eq!(answered["state"], "Review");
        assert_eq!(answered["scheduledDays"], 3.0);
        assert!(answered["lastReviewed"].is_string());

        // Nothing is due any more.
        let due: Vec<Value> = client
            .get(format!("{base}/cards/due?user=alice"))
            .send()
            .await?
            .json()
            .await?;
        assert!(due.is_empty());

        // Fetch it.
        let response = client.get(format!("{base}/cards/{id}?user=alice")).send().await?;
        assert!(response.status().is_success());
        let fetched: Value = response.json().await?;
        assert_eq!(fetched, answered);

        // Stats.
        let stats: Value = client
            .get(format!("{base}/cards/stats?user=alice"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(
            stats,
            json!({"total": 1, "due": 0, "learning": 0, "review": 1, "relearning": 0})
        );

        // Search.
        let found: Vec<Value> = client
            .get(format!("{base}/cards/search?user=alice&q=DOG"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(found.len(), 1);
        let found: Vec<Value> = client
            .get(format!("{base}/cards/search?user=alice&q=%20"))
            .send()
            .await?
            .json()
            .await?;
        assert!(found.is_empty());

        // Another user sees nothing.
        let response = client.get(format!("{base}/cards/{id}?user=bob")).send().await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], "CardNotFound");

        // Delete the card.
        let response = client.delete(format!("{base}/cards/{id}?user=alice")).send().await?;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = client.delete(format!("{base}/cards/{id}?user=alice")).send().await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Delete the user.
        let response = client.delete(format!("{base}/users/alice")).send().await?;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = client.delete(format!("{base}/users/alice")).send().await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        Ok(())
    }

    #[tokio::test]
    async fn test_errors() -> TestResult {
        let (_dir, base) = spawn_server().await?;
        let client = Client::new();

        // Missing user.
        let response = client.get(format!("{base}/cards/due")).send().await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], "InvalidUser");

        // Empty word.
        let response = client
            .post(format!("{base}/cards?user=alice"))
            .json(&json!({ "word": "   " }))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], "InvalidCardData");

        // Bodies that do not decode are invalid card data.
        let response = client
            .post(format!("{base}/cards?user=alice"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], "InvalidCardData");
        let response = client
            .post(format!("{base}/cards?user=alice"))
            .json(&json!({ "word": 5 }))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], "InvalidCardData");

        let card: Value = client
            .post(format!("{base}/cards?user=alice"))
            .json(&json!({ "word": "Katze" }))
            .send()
            .await?
            .json()
            .await?;
        let id = card["id"].as_i64().unwrap();

        // Rating out of range leaves the card untouched.
        let response = client
            .post(format!("{base}/cards/{id}/answer?user=alice"))
            .json(&json!({ "rating": 6 }))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], "InvalidRating");
        let fetched: Value = client
            .get(format!("{base}/cards/{id}?user=alice"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(fetched, card);

        // Ratings that are not integers are invalid ratings too.
        for rating_body in [json!({ "rating": 2.5 }), json!({ "rating": "3" }), json!({})] {
            let response = client
                .post(format!("{base}/cards/{id}/answer?user=alice"))
                .json(&rating_body)
                .send()
                .await?;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body: Value = response.json().await?;
            assert_eq!(body["error"], "InvalidRating");
        }
        let response = client
            .post(format!("{base}/cards/{id}/answer?user=alice"))
            .header("content-type", "application/json")
            .body("rating=3")
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], "InvalidRating");

        // Unknown card.
        let response = client
            .post(format!("{base}/cards/9999/answer?user=alice"))
            .json(&json!({ "rating": 3 }))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Non-numeric id.
        let response = client.get(format!("{base}/cards/abc?user=alice")).send().await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], "BadRequest");

        // Unknown route.
        let response = client.get(format!("{base}/herp-derp")).send().await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], "NotFound");

        Ok(())
    }
}
