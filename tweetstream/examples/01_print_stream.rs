mod common;
use tweetstream::{StreamEvent, Streamer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    common::init_tracing();

    // 1. Open the body (live endpoint, or the recorded stream in CI).
    let source = common::get_source().await?;

    // 2. Start decoding with default channel sizes and a continue-on-error policy.
    let mut stream = Streamer::builder().build()?.open(source)?;

    // 3. Print everything until the body ends or fails.
    while let Some(ev) = stream.next_event().await {
        match ev {
            StreamEvent::Data(msg) => {
                for tweet in &msg.tweets {
                    let tags: Vec<&str> = msg.matching_rules.iter().map(|r| r.tag.as_str()).collect();
                    println!("[{}] {} {tags:?}", tweet.id, tweet.text);
                }
            }
            StreamEvent::Notice(n) => {
                println!("notice {} at {}: {}", n.kind(), n.body().sent, n.body().message.trim());
            }
            StreamEvent::Error(e) if e.is_terminal() => eprintln!("stream ended: {e}"),
            StreamEvent::Error(e) => eprintln!("skipped record: {e}"),
        }
    }

    println!("stats: {:?}", stream.stats());
    Ok(())
}
