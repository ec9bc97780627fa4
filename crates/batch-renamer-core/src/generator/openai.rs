use super::NameGenerator;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::prompt::GenerationRequest;
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Models offered by the default endpoint, with a short description.
pub const KNOWN_MODELS: &[(&str, &str)] = &[
    ("qwen-turbo", "fastest, cheapest"),
    ("qwen-plus", "balanced quality and speed"),
    ("qwen-max", "highest quality"),
];

/// Longest error body echoed back in an error message.
const MAX_ERROR_BODY: usize = 300;

/// Client for any endpoint speaking the OpenAI chat-completions protocol.
pub struct OpenAiCompatibleGenerator {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiCompatibleGenerator {
    pub fn new(
        api_base: &str,
        api_key: &str,
        model: &str,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::MissingCredential);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            temperature,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config.api_key.as_deref().ok_or(Error::MissingCredential)?;
        Self::new(
            &config.api_base,
            api_key,
            &config.model,
            config.temperature,
            config.request_timeout(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, request: &GenerationRequest) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
            "temperature": self.temperature,
        })
    }
}

impl NameGenerator for OpenAiCompatibleGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base);
        debug!("POST {} (model {})", url, self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(request))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(Error::Generation(format!("HTTP {}: {}", status, body)));
        }

        let response_json: Value = response.json()?;
        extract_content(&response_json)
    }
}

/// Pulls `choices[0].message.content` out of a chat-completions response.
fn extract_content(response_json: &Value) -> Result<String> {
    if let Some(message) = response_json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Err(Error::Generation(message.to_string()));
    }

    let choice = response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| Error::Generation("no choices in response".to_string()))?;

    choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::Generation("no message content in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    /// Accepts one connection on a local port and reads the request. Then it
    /// writes `response`, or holds the connection silent for `hold` when there
    /// is none. Returns the API base URL to point the client at.
    fn serve_once(response: Option<String>, hold: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let api_base = format!("http://{}/v1", listener.local_addr().unwrap());
        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            read_request(&mut stream);
            match response {
                Some(response) => {
                    let _ = stream.write_all(response.as_bytes());
                }
                None => thread::sleep(hold),
            }
        });
        api_base
    }

    fn read_request(stream: &mut TcpStream) {
        let mut received = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = match stream.read(&mut chunk) {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            received.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&received);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if received.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    fn local_generator(api_base: &str, timeout: Duration) -> OpenAiCompatibleGenerator {
        OpenAiCompatibleGenerator::new(api_base, "sk-test", "qwen-turbo", 0.7, timeout).unwrap()
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            system: "sys".to_string(),
            prompt: "1. v1.mp4".to_string(),
        }
    }

    #[test]
    fn test_generate_returns_reply_content() {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "1. My Trip" } }]
        })
        .to_string();
        let api_base = serve_once(Some(http_response("200 OK", &body)), Duration::ZERO);

        let reply = local_generator(&api_base, Duration::from_secs(5))
            .generate(&request())
            .unwrap();
        assert_eq!(reply, "1. My Trip");
    }

    #[test]
    fn test_silent_server_times_out() {
        let api_base = serve_once(None, Duration::from_secs(3));
        let start = std::time::Instant::now();

        match local_generator(&api_base, Duration::from_millis(200)).generate(&request()) {
            Err(Error::Generation(msg)) => assert!(msg.contains("timed out"), "{}", msg),
            other => panic!("unexpected {:?}", other),
        }
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_error_status_is_reported_with_truncated_body() {
        let body = "x".repeat(1000);
        let api_base = serve_once(
            Some(http_response("500 Internal Server Error", &body)),
            Duration::ZERO,
        );

        match local_generator(&api_base, Duration::from_secs(5)).generate(&request()) {
            Err(Error::Generation(msg)) => {
                assert!(msg.contains("500"), "{}", msg);
                assert_eq!(msg.matches('x').count(), MAX_ERROR_BODY);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_malformed_body_is_a_generation_error() {
        let api_base = serve_once(Some(http_response("200 OK", "not json")), Duration::ZERO);

        assert!(matches!(
            local_generator(&api_base, Duration::from_secs(5)).generate(&request()),
            Err(Error::Generation(_))
        ));
    }

    #[test]
    fn test_extract_content() {
        let body = json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "1. Trip\n2. Walk" } }
            ]
        });
        assert_eq!(extract_content(&body).unwrap(), "1. Trip\n2. Walk");
    }

    #[test]
    fn test_extract_content_errors() {
        assert!(matches!(
            extract_content(&json!({ "choices": [] })),
            Err(Error::Generation(_))
        ));
        assert!(matches!(
            extract_content(&json!({ "choices": [{ "message": {} }] })),
            Err(Error::Generation(_))
        ));
        match extract_content(&json!({ "error": { "message": "Invalid API-key" } })) {
            Err(Error::Generation(msg)) => assert_eq!(msg, "Invalid API-key"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let generator = OpenAiCompatibleGenerator::new(
            "https://example.invalid/v1/",
            "sk-test",
            "qwen-plus",
            0.5,
            Duration::from_secs(5),
        )
        .unwrap();
        let body = generator.request_body(&GenerationRequest {
            system: "sys".to_string(),
            prompt: "user".to_string(),
        });

        assert_eq!(generator.api_base, "https://example.invalid/v1");
        assert_eq!(body["model"], "qwen-plus");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "sys");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "user");
    }

    #[test]
    fn test_missing_credential() {
        assert!(matches!(
            OpenAiCompatibleGenerator::new("http://x", "  ", "m", 0.7, Duration::from_secs(1)),
            Err(Error::MissingCredential)
        ));
        assert!(matches!(
            OpenAiCompatibleGenerator::from_config(&AppConfig::default()),
            Err(Error::MissingCredential)
        ));
    }
}
