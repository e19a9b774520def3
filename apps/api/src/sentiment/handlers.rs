use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extract::AppJson;
use crate::sentiment::{classify, round3, SentimentLabel};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SentimentRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SentimentResponse {
    pub text: String,
    pub sentiment: SentimentLabel,
    pub polarity: f64,
    pub subjectivity: f64,
}

/// POST /sentiment
pub async fn handle_sentiment(
    State(state): State<AppState>,
    AppJson(request): AppJson<SentimentRequest>,
) -> Result<Json<SentimentResponse>, AppError> {
    if request.text.is_empty() {
        return Err(AppError::BadRequest(
            "Provide text for sentiment analysis".to_string(),
        ));
    }

    let scores = state.sentiment.analyze(&request.text);

    Ok(Json(SentimentResponse {
        sentiment: classify(scores.polarity),
        polarity: round3(scores.polarity),
        subjectivity: round3(scores.subjectivity),
        text: request.text,
    }))
}
