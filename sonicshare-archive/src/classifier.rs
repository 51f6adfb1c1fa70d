//! Zero-shot text classification client
//!
//! Used to suggest genres for a free-text description of a track. The service
//! is a black box: any failure surfaces as [`ClassifierError`] and never
//! touches the archive.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sonicshare_common::config::ClassifierConfig;
use thiserror::Error;

const USER_AGENT: &str = concat!("SonicShare/", env!("CARGO_PKG_VERSION"));

/// Genres offered for classification
pub const DEFAULT_GENRES: [&str; 10] = [
    "Neo-Soul",
    "R&B",
    "Afrobeats",
    "Hip Hop",
    "Gospel",
    "Jazz",
    "Ambient",
    "Experimental",
    "Lo-fi",
    "House",
];

/// How many of [`DEFAULT_GENRES`] are selected when none are given
pub const DEFAULT_SELECTED_GENRES: usize = 5;

/// Classification errors
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// One candidate label with its confidence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLabel {
    pub label: String,
    /// Confidence in `[0, 1]`
    pub score: f64,
}

/// Labels ranked by confidence, highest first (never empty)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    labels: Vec<ScoredLabel>,
}

impl Classification {
    /// Validate parallel label/score lists and rank them
    pub fn from_ranked(labels: Vec<String>, scores: Vec<f64>) -> Result<Self, ClassifierError> {
        if labels.len() != scores.len() {
            return Err(ClassifierError::InvalidResponse(format!(
                "{} labels but {} scores",
                labels.len(),
                scores.len()
            )));
        }
        if labels.is_empty() {
            return Err(ClassifierError::InvalidResponse("no labels returned".to_string()));
        }
        if let Some(bad) = scores.iter().find(|s| !s.is_finite() || **s < 0.0 || **s > 1.0) {
            return Err(ClassifierError::InvalidResponse(format!(
                "score {} outside [0, 1]",
                bad
            )));
        }

        let mut ranked: Vec<ScoredLabel> = labels
            .into_iter()
            .zip(scores)
            .map(|(label, score)| ScoredLabel { label, score })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(Self { labels: ranked })
    }

    pub fn labels(&self) -> &[ScoredLabel] {
        &self.labels
    }

    /// Highest-confidence label
    pub fn top(&self) -> &ScoredLabel {
        // from_ranked guarantees at least one label
        &self.labels[0]
    }

    /// Text bar chart, one line per label
    pub fn render_chart(&self, bar_width: usize) -> String {
        let name_width = self.labels.iter().map(|l| l.label.chars().count()).max().unwrap_or(0);
        let mut out = String::new();
        for l in &self.labels {
            let filled = (l.score * bar_width as f64).round() as usize;
            out.push_str(&format!(
                "{:<name_width$} |{}{}| {:>6.2}%\n",
                l.label,
                "#".repeat(filled),
                " ".repeat(bar_width.saturating_sub(filled)),
                l.score * 100.0,
            ));
        }
        out
    }

    /// One-line summary of the best match
    pub fn top_match_line(&self) -> String {
        let top = self.top();
        format!("Top match: {} with {:.2}% confidence", top.label, top.score * 100.0)
    }
}

/// External zero-shot classifier
#[allow(async_fn_in_trait)]
pub trait TextClassifier {
    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> Result<Classification, ClassifierError>;
}

/// Validate inputs, call the classifier, and check the answer only names
/// requested labels
pub async fn classify_description<C: TextClassifier>(
    classifier: &C,
    description: &str,
    candidate_labels: &[String],
) -> Result<Classification, ClassifierError> {
    let text = description.trim();
    if text.is_empty() {
        return Err(ClassifierError::InvalidRequest(
            "Please enter a description before classifying".to_string(),
        ));
    }

    let mut labels: Vec<String> = Vec::with_capacity(candidate_labels.len());
    for label in candidate_labels {
        let label = label.trim();
        if !label.is_empty() && !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }
    if labels.is_empty() {
        return Err(ClassifierError::InvalidRequest(
            "Select at least one genre to compare".to_string(),
        ));
    }

    let result = classifier.classify(text, &labels).await?;
    if let Some(stray) = result.labels().iter().find(|l| !labels.contains(&l.label)) {
        return Err(ClassifierError::InvalidResponse(format!(
            "unrequested label '{}'",
            stray.label
        )));
    }
    Ok(result)
}

/// Genre candidates: explicit list, or the default selection
pub fn candidate_genres(explicit: &[String]) -> Vec<String> {
    if explicit.is_empty() {
        DEFAULT_GENRES[..DEFAULT_SELECTED_GENRES]
            .iter()
            .map(|g| g.to_string())
            .collect()
    } else {
        explicit.to_vec()
    }
}

#[derive(Debug, Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Debug, Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ZeroShotOutput {
    labels: Vec<String>,
    scores: Vec<f64>,
}

/// The inference API answers with either a single object or a one-element list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotResponse {
    Single(ZeroShotOutput),
    Batch(Vec<ZeroShotOutput>),
}

impl ZeroShotResponse {
    fn into_output(self) -> Result<ZeroShotOutput, ClassifierError> {
        match self {
            ZeroShotResponse::Single(out) => Ok(out),
            ZeroShotResponse::Batch(outs) => outs
                .into_iter()
                .next()
                .ok_or_else(|| ClassifierError::InvalidResponse("empty batch".to_string())),
        }
    }
}

/// Hugging Face hosted inference client
pub struct HuggingFaceClassifier {
    http_client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HuggingFaceClassifier {
    /// Build a client; the token is read from the configured env variable
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let token = std::env::var(&config.token_env).ok().filter(|t| !t.is_empty());
        if token.is_none() {
            tracing::debug!("{} not set; calling inference API anonymously", config.token_env);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassifierError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            url: format!(
                "{}/{}",
                config.endpoint.trim_end_matches('/'),
                config.model.trim_start_matches('/')
            ),
            token,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl TextClassifier for HuggingFaceClassifier {
    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> Result<Classification, ClassifierError> {
        tracing::debug!(url = %self.url, labels = candidate_labels.len(), "Zero-shot request");

        let body = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters { candidate_labels },
        };

        let mut request = self.http_client.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClassifierError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status_code = status.as_u16(), "Classification request failed");
            return Err(ClassifierError::ApiError(status.as_u16(), message));
        }

        let parsed: ZeroShotResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::ParseError(e.to_string()))?;
        let output = parsed.into_output()?;

        Classification::from_ranked(output.labels, output.scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier {
        labels: Vec<&'static str>,
        scores: Vec<f64>,
    }

    impl TextClassifier for FixedClassifier {
        async fn classify(
            &self,
            _text: &str,
            _candidate_labels: &[String],
        ) -> Result<Classification, ClassifierError> {
            Classification::from_ranked(
                self.labels.iter().map(|l| l.to_string()).collect(),
                self.scores.clone(),
            )
        }
    }

    fn genres(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ranking_sorts_descending() {
        let c = Classification::from_ranked(genres(&["Jazz", "Gospel", "House"]), vec![0.1, 0.7, 0.2])
            .unwrap();
        let order: Vec<&str> = c.labels().iter().map(|l| l.label.as_str()).collect();
        assert_eq!(order, vec!["Gospel", "House", "Jazz"]);
        assert_eq!(c.top().label, "Gospel");
        assert_eq!(c.top_match_line(), "Top match: Gospel with 70.00% confidence");
    }

    #[test]
    fn test_rejects_out_of_range_scores() {
        assert!(Classification::from_ranked(genres(&["Jazz"]), vec![1.5]).is_err());
        assert!(Classification::from_ranked(genres(&["Jazz"]), vec![f64::NAN]).is_err());
        assert!(Classification::from_ranked(genres(&["Jazz"]), vec![]).is_err());
        assert!(Classification::from_ranked(vec![], vec![]).is_err());
    }

    #[test]
    fn test_render_chart_bar_lengths() {
        let c = Classification::from_ranked(genres(&["Jazz", "R&B"]), vec![0.5, 0.25]).unwrap();
        let chart = c.render_chart(8);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0], "Jazz |####    |  50.00%");
        assert_eq!(lines[1], "R&B  |##      |  25.00%");
    }

    #[test]
    fn test_candidate_genres_default_selection() {
        assert_eq!(
            candidate_genres(&[]),
            genres(&["Neo-Soul", "R&B", "Afrobeats", "Hip Hop", "Gospel"])
        );
        assert_eq!(candidate_genres(&genres(&["Jazz"])), genres(&["Jazz"]));
    }

    #[test]
    fn test_response_shapes_deserialize() {
        let single: ZeroShotResponse =
            serde_json::from_str(r#"{"sequence":"x","labels":["Jazz"],"scores":[0.9]}"#).unwrap();
        assert_eq!(single.into_output().unwrap().labels, vec!["Jazz"]);

        let batch: ZeroShotResponse =
            serde_json::from_str(r#"[{"sequence":"x","labels":["House"],"scores":[0.4]}]"#).unwrap();
        assert_eq!(batch.into_output().unwrap().scores, vec![0.4]);
    }

    #[tokio::test]
    async fn test_classify_description_validates_input() {
        let fake = FixedClassifier {
            labels: vec!["Jazz"],
            scores: vec![1.0],
        };
        let err = classify_description(&fake, "   ", &genres(&["Jazz"])).await.unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidRequest(_)));

        let err = classify_description(&fake, "smoky", &[]).await.unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_classify_description_rejects_unrequested_labels() {
        let fake = FixedClassifier {
            labels: vec!["Polka"],
            scores: vec![0.9],
        };
        let err = classify_description(&fake, "oom-pah", &genres(&["Jazz"])).await.unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_classify_description_success() {
        let fake = FixedClassifier {
            labels: vec!["Jazz", "Gospel"],
            scores: vec![0.3, 0.6],
        };
        let result = classify_description(&fake, "choir with brushed drums", &genres(&["Jazz", "Gospel"]))
            .await
            .unwrap();
        assert_eq!(result.top().label, "Gospel");
    }
}
