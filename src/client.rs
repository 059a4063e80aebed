use tokio::time::sleep;

use crate::{
    normalize::{normalize, Normalized},
    Answer, ClientOptions, ConfigError, EndpointConfig, HttpTransport, PostRequest, QaError,
    QueryRequest, QueryResult, Result, Transport,
};

#[derive(Clone, Debug)]
/// Question-answering client for a hosted inference model endpoint.
///
/// Each call is a linear sequence of awaited requests: a response with
/// status 429 or 503 is retried after a linear backoff, everything else
/// ends the call.
pub struct QaClient<T = HttpTransport> {
    transport: T,
    config: EndpointConfig,
    options: ClientOptions,
}

impl QaClient<HttpTransport> {
    /// Creates a client that talks to the configured endpoint over HTTPS.
    pub fn new(config: EndpointConfig) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }

    /// Creates a client from `HF_MODEL`, `HF_TOKEN` and `HF_API_BASE`.
    ///
    /// See [`EndpointConfig::from_env`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// use hf_qa_http::QaClient;
    ///
    /// # async fn run() -> Result<(), hf_qa_http::ConfigError> {
    /// let qa = QaClient::from_env();
    /// let result = qa
    ///     .answer("What is the capital?", "Paris is the capital of France.")
    ///     .await?;
    /// println!("{} ({:.2})", result.answer, result.score);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_env() -> Self {
        Self::new(EndpointConfig::from_env())
    }
}

impl<T: Transport> QaClient<T> {
    /// Creates a client over a custom [`Transport`].
    pub fn with_transport(config: EndpointConfig, transport: T) -> Self {
        Self {
            transport,
            config,
            options: ClientOptions::default(),
        }
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Answers `question` from `context` and returns the uniform result record.
    ///
    /// Runtime failures (network, HTTP status, decoding, exhausted retries)
    /// are reported inside the record. Only configuration problems are
    /// returned as `Err`, before any request is made.
    pub async fn answer(
        &self,
        question: impl Into<String>,
        context: impl Into<String>,
    ) -> std::result::Result<QueryResult, ConfigError> {
        self.answer_with_max_retries(question, context, self.options.max_retries)
            .await
    }

    /// Like [`QaClient::answer`] with an explicit attempt budget.
    pub async fn answer_with_max_retries(
        &self,
        question: impl Into<String>,
        context: impl Into<String>,
        max_retries: usize,
    ) -> std::result::Result<QueryResult, ConfigError> {
        let request = QueryRequest::new(question, context);
        match self.ask_with_max_retries(&request, max_retries).await {
            Err(QaError::Config(err)) => Err(err),
            outcome => Ok(QueryResult::from(outcome)),
        }
    }

    /// Answers a request, returning the extracted span or a typed error.
    pub async fn ask(&self, request: &QueryRequest) -> Result<Answer> {
        self.ask_with_max_retries(request, self.options.max_retries)
            .await
    }

    /// Like [`QaClient::ask`] with an explicit attempt budget.
    ///
    /// `max_retries` counts every attempt including the first; `0` issues no
    /// request and yields [`QaError::RetriesExhausted`].
    pub async fn ask_with_max_retries(
        &self,
        request: &QueryRequest,
        max_retries: usize,
    ) -> Result<Answer> {
        let authorization = self.config.authorization()?;
        let url = self.config.url();

        let mut attempt = 0usize;
        while attempt < max_retries {
            attempt += 1;

            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, max_retries, url = %url, "posting question");

            let response = self
                .transport
                .post(PostRequest {
                    url: &url,
                    authorization: &authorization,
                    payload: request,
                    timeout: self.options.timeout(),
                })
                .await;

            let response = match response {
                Ok(response) => response,
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(attempt, error = %err, "question request failed");
                    return Err(QaError::Transport(err));
                }
            };

            match normalize(&response) {
                Normalized::Done(outcome) => {
                    #[cfg(feature = "tracing")]
                    if let Err(err) = &outcome {
                        tracing::warn!(attempt, status = response.status, error = %err, "question rejected");
                    }
                    return outcome;
                }
                Normalized::Retry => self.wait_before_retry(attempt, response.status).await,
            }
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(attempts = attempt, "max retries exceeded");

        Err(QaError::RetriesExhausted { attempts: attempt })
    }

    /// Sleeps `attempt × retry_backoff_ms` after a retryable status.
    ///
    /// Also runs after the final attempt before exhaustion is reported.
    async fn wait_before_retry(&self, attempt: usize, status: u16) {
        let delay = self.options.backoff_delay(attempt);

        #[cfg(feature = "tracing")]
        tracing::debug!(attempt, status, "retrying question after {} ms", delay.as_millis());
        #[cfg(not(feature = "tracing"))]
        let _ = status;

        sleep(delay).await;
    }
}
