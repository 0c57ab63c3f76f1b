use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};

#[derive(Serialize)]
struct AskRequest {
    question: String,
}

/// Answer from the agent. `cdp`/`task` may be absent, null, or the
/// literal string "None" when the backend could not identify them.
#[derive(Debug, Clone, Deserialize)]
pub struct AskReply {
    pub answer: String,
    #[serde(default)]
    pub cdp: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
}

#[derive(Deserialize)]
struct SupportedCdpsResponse {
    cdps: Vec<String>,
}

#[derive(Clone)]
pub struct AgentClient {
    client: Client,
    base_url: String,
}

impl AgentClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List the platform names the agent can answer questions about.
    pub async fn supported_cdps(&self) -> Result<Vec<String>> {
        let url = format!("{}/supported-cdps", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("failed to fetch supported CDPs: {}", response.status()));
        }

        let cdps_response: SupportedCdpsResponse = response.json().await?;
        Ok(cdps_response.cdps)
    }

    pub async fn ask(&self, question: &str) -> Result<AskReply> {
        let url = format!("{}/ask", self.base_url);

        let request = AskRequest {
            question: question.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("agent request failed with status: {}", response.status()));
        }

        let reply: AskReply = response.json().await?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_reply_full() {
        let reply: AskReply =
            serde_json::from_str(r#"{"answer":"It's a CDP.","cdp":"Segment","task":"lookup"}"#)
                .unwrap();
        assert_eq!(reply.answer, "It's a CDP.");
        assert_eq!(reply.cdp.as_deref(), Some("Segment"));
        assert_eq!(reply.task.as_deref(), Some("lookup"));
    }

    #[test]
    fn test_ask_reply_null_metadata() {
        // The backend sends JSON null when no platform was identified
        let reply: AskReply =
            serde_json::from_str(r#"{"answer":"Please specify a platform.","cdp":null,"task":null}"#)
                .unwrap();
        assert!(reply.cdp.is_none());
        assert!(reply.task.is_none());
    }

    #[test]
    fn test_ask_reply_missing_metadata() {
        let reply: AskReply = serde_json::from_str(r#"{"answer":"Hi."}"#).unwrap();
        assert!(reply.cdp.is_none());
        assert!(reply.task.is_none());
    }

    #[test]
    fn test_ask_reply_none_literal_is_kept_verbatim() {
        // "None" as a string is the identifier's sentinel, not JSON null.
        // Filtering it is the renderer's job, not the wire layer's.
        let reply: AskReply =
            serde_json::from_str(r#"{"answer":"ok","cdp":"None","task":"None"}"#).unwrap();
        assert_eq!(reply.cdp.as_deref(), Some("None"));
        assert_eq!(reply.task.as_deref(), Some("None"));
    }

    #[test]
    fn test_supported_cdps_shape() {
        let parsed: SupportedCdpsResponse =
            serde_json::from_str(r#"{"cdps":["Segment","mParticle","Lytics"]}"#).unwrap();
        assert_eq!(parsed.cdps.len(), 3);
        assert_eq!(parsed.cdps[0], "Segment");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = AgentClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
