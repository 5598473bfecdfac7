use tweetstream::{ByteSource, StreamError};

/// Default endpoint when `TWEETSTREAM_URL` is unset.
pub const SAMPLE_URL: &str = "https://api.twitter.com/2/tweets/sample/stream";

/// Route tracing output to stderr, filtered by `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tweetstream=debug")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Open the stream body: the recorded fixture when
/// `TWEETSTREAM_EXAMPLES_USE_MOCK` is set (CI), the live endpoint otherwise.
pub async fn get_source() -> Result<Box<dyn ByteSource>, StreamError> {
    if std::env::var("TWEETSTREAM_EXAMPLES_USE_MOCK").is_ok() {
        println!("--- (Using recorded stream for CI) ---");
        return Ok(Box::new(
            tweetstream_mock::ScriptedSource::builder()
                .chunked(tweetstream_mock::fixtures::recorded_stream(), 16)
                .build(),
        ));
    }

    let token = std::env::var("TWEETSTREAM_BEARER_TOKEN")
        .map_err(|_| StreamError::InvalidArg("TWEETSTREAM_BEARER_TOKEN is not set".into()))?;
    let url = std::env::var("TWEETSTREAM_URL").unwrap_or_else(|_| SAMPLE_URL.to_string());
    let resp = reqwest::Client::new()
        .get(url)
        .bearer_auth(token)
        .send()
        .await
        .map_err(StreamError::transport)?;
    let body = tweetstream_http::HttpBody::from_response(resp).await?;
    Ok(Box::new(body))
}
