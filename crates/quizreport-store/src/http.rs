//! REST backend for the assessment server.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use quizreport_core::error::{ReportError, Result};
use quizreport_core::model::{Attempt, Packet, Question, Quiz, ScoreScale, User};
use quizreport_core::template::ReportTemplate;
use quizreport_core::traits::{DataSource, PacketStore, TemplateStore};

use crate::error::StoreError;

/// Backend talking to the assessment server's `/api` routes.
pub struct HttpBackend {
    base_url: String,
    api_token: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ApiError {
    error: String,
}

#[derive(Deserialize)]
struct TemplateEnvelope {
    #[serde(default)]
    template: Option<ReportTemplate>,
}

#[derive(Serialize)]
struct TemplateBody<'a> {
    template: &'a ReportTemplate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PacketScaleBody<'a> {
    scoring_scale: &'a ScoreScale,
    enable_scoring_scale: bool,
}

impl HttpBackend {
    pub fn new(
        base_url: &str,
        api_token: Option<String>,
        timeout_secs: u64,
    ) -> std::result::Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.filter(|t| !t.is_empty()),
            timeout_secs,
            client,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        path: &str,
    ) -> std::result::Result<Response, StoreError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(self.timeout_secs)
            } else {
                StoreError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(StoreError::NotFound(path.to_string()));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(StoreError::Http { status, message });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, StoreError> {
        let response = self.send(self.request(Method::GET, path), path).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("failed to parse {path}: {e}")))
    }

    async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> std::result::Result<(), StoreError> {
        self.send(self.request(Method::PUT, path).json(body), path)
            .await?;
        Ok(())
    }

    async fn packet_questions(&self, packet_id: &str) -> Result<Vec<Question>> {
        self.get_json(&format!("/api/questions?packet_id={packet_id}"))
            .await
            .map_err(|e| e.into_fetch(format!("questions of packet {packet_id}")))
    }
}

#[async_trait]
impl DataSource for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn quiz(&self, quiz_id: &str) -> Result<Quiz> {
        self.get_json(&format!("/api/quizzes/{quiz_id}"))
            .await
            .map_err(|e| e.into_fetch(format!("quiz {quiz_id}")))
    }

    /// The server has no single-attempt route; the attempt is located in the
    /// full listing.
    #[instrument(skip(self))]
    async fn attempt(&self, attempt_id: &str) -> Result<Attempt> {
        let attempts: Vec<Attempt> = self
            .get_json("/api/quiz-attempts")
            .await
            .map_err(|e| e.into_fetch(format!("attempt {attempt_id}")))?;
        attempts
            .into_iter()
            .find(|a| a.id == attempt_id)
            .ok_or_else(|| {
                ReportError::data_fetch(
                    format!("attempt {attempt_id}"),
                    Some(404),
                    "not present in the attempt listing",
                )
            })
    }

    /// Packets listed without questions get them from the questions route.
    #[instrument(skip(self))]
    async fn quiz_packets(&self, quiz_id: &str) -> Result<Vec<Packet>> {
        let mut packets: Vec<Packet> = self
            .get_json(&format!("/api/quiz-packets/{quiz_id}"))
            .await
            .map_err(|e| e.into_fetch(format!("packets of quiz {quiz_id}")))?;

        let missing: Vec<usize> = packets
            .iter()
            .enumerate()
            .filter(|(_, p)| p.questions.is_empty())
            .map(|(i, _)| i)
            .collect();
        let fetched = futures::future::try_join_all(
            missing.iter().map(|&i| self.packet_questions(&packets[i].id)),
        )
        .await?;
        for (i, questions) in missing.into_iter().zip(fetched) {
            packets[i].questions = questions;
        }
        Ok(packets)
    }

    #[instrument(skip(self))]
    async fn user(&self, user_id: &str) -> Result<User> {
        self.get_json(&format!("/api/users/{user_id}"))
            .await
            .map_err(|e| e.into_fetch(format!("user {user_id}")))
    }
}

#[async_trait]
impl TemplateStore for HttpBackend {
    #[instrument(skip(self))]
    async fn load_template(&self, quiz_id: &str) -> Result<Option<ReportTemplate>> {
        match self
            .get_json::<TemplateEnvelope>(&format!("/api/pdf-templates/{quiz_id}"))
            .await
        {
            Ok(envelope) => Ok(envelope.template),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into_fetch(format!("template of quiz {quiz_id}"))),
        }
    }

    #[instrument(skip(self, template))]
    async fn save_template(&self, quiz_id: &str, template: &ReportTemplate) -> Result<()> {
        self.put_json(
            &format!("/api/pdf-templates/{quiz_id}"),
            &TemplateBody { template },
        )
        .await
        .map_err(|e| e.into_persist(format!("template of quiz {quiz_id}")))
    }
}

#[async_trait]
impl PacketStore for HttpBackend {
    #[instrument(skip(self, scale))]
    async fn save_packet_scale(
        &self,
        packet_id: &str,
        scale: &ScoreScale,
        enabled: bool,
    ) -> Result<()> {
        self.put_json(
            &format!("/api/packets/{packet_id}"),
            &PacketScaleBody {
                scoring_scale: scale,
                enable_scoring_scale: enabled,
            },
        )
        .await
        .map_err(|e| e.into_persist(format!("scale of packet {packet_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizreport_core::model::ScoreRange;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> HttpBackend {
        HttpBackend::new(&server.uri(), Some("test-token".into()), 5).unwrap()
    }

    #[tokio::test]
    async fn fetches_quiz_with_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/quizzes/q1"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "q1",
                "name": "Wellbeing Check",
                "time_limit": 30
            })))
            .mount(&server)
            .await;

        let quiz = backend(&server).quiz("q1").await.unwrap();
        assert_eq!(quiz.name, "Wellbeing Check");
        assert_eq!(quiz.time_limit, Some(30));
    }

    #[tokio::test]
    async fn server_error_is_a_fetch_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/quizzes/q1"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "db down"})),
            )
            .mount(&server)
            .await;

        let err = backend(&server).quiz("q1").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("db down"));
    }

    #[tokio::test]
    async fn attempt_is_located_in_listing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/quiz-attempts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "a1", "quiz_id": "q1", "total_marks": 4},
                {"id": "a2", "quiz_id": "q1", "total_marks": 9,
                 "packet_marks": "{\"Stress\":{\"marks\":9,\"questions\":3}}",
                 "completed_at": "2024-03-05 10:00:00"}
            ])))
            .mount(&server)
            .await;

        let backend = backend(&server);
        let attempt = backend.attempt("a2").await.unwrap();
        assert_eq!(attempt.packet_marks["Stress"].marks, 9);
        assert!(attempt.completed_at.is_some());

        let err = backend.attempt("a9").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn packets_without_questions_are_backfilled() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/quiz-packets/q1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "p1", "name": "Stress", "questionCount": 1}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/questions"))
            .and(query_param("packet_id", "p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "x1", "packet_id": "p1", "question_text": "How often?",
                 "question_type": "multiple_choice",
                 "options": [{"text": "Never", "marks": 0}, {"text": "Daily", "marks": 3}]}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let packets = backend(&server).quiz_packets("q1").await.unwrap();
        assert_eq!(packets[0].questions.len(), 1);
        assert_eq!(packets[0].questions[0].options[1].marks(), Some(3));
    }

    #[tokio::test]
    async fn missing_template_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/pdf-templates/q1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(backend(&server).load_template("q1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn template_read_failure_aborts() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/pdf-templates/q1"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = backend(&server).load_template("q1").await.unwrap_err();
        assert_eq!(err.status(), Some(502));
    }

    #[tokio::test]
    async fn template_round_trips_through_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/pdf-templates/q1"))
            .and(body_partial_json(serde_json::json!({
                "template": {"header": {"title": "Term Report"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let mut template = ReportTemplate::default();
        template.header.title = "Term Report".into();
        backend(&server).save_template("q1", &template).await.unwrap();
    }

    #[tokio::test]
    async fn packet_scale_is_saved_camel_case() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/packets/p1"))
            .and(body_partial_json(serde_json::json!({
                "enableScoringScale": true
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let scale = ScoreScale::new(vec![ScoreRange::new(0, 5, "Low", "#ff6b6b", "📚", "")]);
        backend(&server)
            .save_packet_scale("p1", &scale, true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn write_failure_is_a_persist_error() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/packets/p1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = backend(&server)
            .save_packet_scale("p1", &ScoreScale::default(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Persist { .. }));
    }
}
