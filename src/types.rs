use serde::{Deserialize, Serialize};

use crate::QaError;

/// A question and the passage it should be answered from.
///
/// Serializes to the request payload `{"question": ..., "context": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    pub question: String,
    pub context: String,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            context: context.into(),
        }
    }

    /// Checks that both fields contain something other than whitespace.
    ///
    /// The client does not call this; it is for callers collecting input.
    pub fn validate(&self) -> Result<(), QaError> {
        if self.question.trim().is_empty() || self.context.trim().is_empty() {
            return Err(QaError::EmptyInput);
        }
        Ok(())
    }
}

/// Answer span extracted by the remote model.
#[derive(Clone, Debug, PartialEq, Default, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub answer: String,
    /// Model confidence in `[0, 1]`.
    #[serde(default)]
    pub score: f64,
    /// Character offset of the span start in the context, when reported.
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
}

/// Uniform outcome record of one question.
///
/// Either `ok` is `true` and `answer`/`score` are populated, or `ok` is
/// `false` and `error` holds the message. `score` is meaningless when `ok`
/// is `false`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryResult {
    pub ok: bool,
    pub answer: String,
    pub score: f64,
    pub error: Option<String>,
    pub status_code: Option<u16>,
}

impl QueryResult {
    pub fn success(answer: Answer) -> Self {
        Self {
            ok: true,
            answer: answer.answer,
            score: answer.score,
            error: None,
            status_code: Some(200),
        }
    }

    pub fn failure(err: &QaError) -> Self {
        Self {
            ok: false,
            answer: String::new(),
            score: 0.0,
            error: Some(err.to_string()),
            status_code: err.status_code(),
        }
    }

    /// Confidence as a percentage, only for successful results.
    pub fn confidence_percent(&self) -> Option<f64> {
        self.ok.then(|| self.score * 100.0)
    }
}

impl From<Result<Answer, QaError>> for QueryResult {
    fn from(result: Result<Answer, QaError>) -> Self {
        match result {
            Ok(answer) => Self::success(answer),
            Err(err) => Self::failure(&err),
        }
    }
}
