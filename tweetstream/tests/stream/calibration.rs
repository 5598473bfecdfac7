use tweetstream::{StatsSnapshot, StreamState, Streamer};
use tweetstream_mock::{ScriptedSource, fixtures};

use crate::helpers::drain;

async fn run_recorded(chunk_size: usize) {
    let source = ScriptedSource::builder()
        .chunked(fixtures::recorded_stream(), chunk_size)
        .build();
    let probe = source.probe();
    let mut stream = Streamer::builder().build().unwrap().open(source).unwrap();

    let got = drain(&mut stream).await;
    assert_eq!(got.tweets, fixtures::recorded_tweets(), "chunk size {chunk_size}");
    assert_eq!(got.notices, fixtures::recorded_notices(), "chunk size {chunk_size}");
    assert!(got.errors.is_empty(), "unexpected errors: {:?}", got.errors);

    stream.close().await;
    assert_eq!(stream.state(), StreamState::Closed);
    assert_eq!(probe.release_count(), 1);
    assert_eq!(
        stream.stats(),
        StatsSnapshot {
            lines: 9,
            keep_alives: 3,
            data_messages: 3,
            notices: 3,
            decode_errors: 0,
            dropped: 0,
        }
    );
}

#[tokio::test]
async fn recorded_stream_in_one_chunk() {
    run_recorded(usize::MAX).await;
}

#[tokio::test]
async fn recorded_stream_byte_by_byte() {
    run_recorded(1).await;
}

#[tokio::test]
async fn recorded_stream_split_mid_delimiter() {
    // 7-byte chunks put "\r" and "\n" of several delimiters in different reads.
    run_recorded(7).await;
}

#[tokio::test]
async fn keep_alives_between_records_yield_nothing() {
    let source = ScriptedSource::builder()
        .keep_alives(5)
        .line(&fixtures::data_line("1", "a", &[]))
        .keep_alives(2)
        .line(&fixtures::notice_line("info", "maintenance soon", "2024-05-01T10:00:00Z"))
        .keep_alives(5)
        .build();
    let mut stream = Streamer::builder().build().unwrap().open(source).unwrap();

    let got = drain(&mut stream).await;
    assert_eq!(got.tweet_ids(), ["1"]);
    assert_eq!(got.notice_messages(), ["maintenance soon"]);
    assert!(got.errors.is_empty());
    assert_eq!(stream.stats().keep_alives, 12);
}

#[tokio::test]
async fn empty_body_closes_all_channels_without_error() {
    let mut stream = Streamer::builder()
        .build()
        .unwrap()
        .open(ScriptedSource::builder().build())
        .unwrap();
    let got = drain(&mut stream).await;
    assert!(got.tweets.is_empty() && got.notices.is_empty() && got.errors.is_empty());
}

#[tokio::test]
async fn data_array_and_rules_are_kept_together() {
    let record = r#"{"data":[{"id":"1","text":"a"},{"id":"2","text":"b","lang":"en"}],"matching_rules":[{"id":"r1","tag":"t1"},{"id":"r2"}],"includes":{"users":[{"id":"u1"}]}}"#;
    let mut stream = Streamer::builder()
        .build()
        .unwrap()
        .open(ScriptedSource::builder().line(record).build())
        .unwrap();

    let got = drain(&mut stream).await;
    assert_eq!(got.tweets.len(), 1);
    let msg = &got.tweets[0];
    assert_eq!(got.tweet_ids(), ["1", "2"]);
    assert_eq!(msg.tweets[1].extra["lang"], "en");
    assert_eq!(msg.matching_rules.len(), 2);
    assert_eq!(msg.matching_rules[1].tag, "");
    assert!(msg.includes.is_some());
}
