mod common;
use std::time::Duration;

use tweetstream::{DecodeErrorPolicy, Streamer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    common::init_tracing();

    let source = common::get_source().await?;
    let streamer = Streamer::builder()
        .data_capacity(256)
        .decode_error_policy(DecodeErrorPolicy::FailAfterConsecutive(10))
        .close_timeout(Duration::from_secs(2))
        .build()?;
    let (closer, parts) = streamer.open(source)?.into_parts();
    let tweetstream::StreamReceivers {
        mut tweets,
        notices,
        errors,
    } = parts;
    // Records for dropped receivers are discarded instead of filling their channels.
    drop((notices, errors));

    println!("Reading tweets for ~5s...");
    let printer = tokio::spawn(async move {
        let mut count = 0usize;
        while let Some(msg) = tweets.recv().await {
            count += msg.tweets.len();
        }
        count
    });

    tokio::time::sleep(Duration::from_secs(5)).await;
    closer.close().await;
    let count = printer.await?;
    println!("stream {} closed after {count} tweets ({:?})", closer.id(), closer.state());
    println!("stats: {:?}", closer.stats());

    Ok(())
}
