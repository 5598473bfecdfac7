use tweetstream::{DecodeErrorKind, DecodeErrorPolicy, StreamError, Streamer};
use tweetstream_mock::{ScriptedSource, fixtures};

use crate::helpers::drain;

fn script(records: &[&str]) -> ScriptedSource {
    ScriptedSource::builder()
        .lines(records.iter().copied())
        .build()
}

fn kinds(errors: &[StreamError]) -> Vec<Option<DecodeErrorKind>> {
    errors.iter().map(StreamError::decode_kind).collect()
}

#[tokio::test]
async fn malformed_record_is_reported_once_and_stream_continues() {
    let d1 = fixtures::data_line("1", "a", &[]);
    let d2 = fixtures::data_line("2", "b", &[]);
    let mut stream = Streamer::builder()
        .build()
        .unwrap()
        .open(script(&[&d1, "{not json", &d2]))
        .unwrap();

    let got = drain(&mut stream).await;
    assert_eq!(got.tweet_ids(), ["1", "2"]);
    assert_eq!(kinds(&got.errors), [Some(DecodeErrorKind::MalformedJson)]);
    assert!(!got.errors[0].is_terminal());
    assert_eq!(stream.stats().decode_errors, 1);
}

#[tokio::test]
async fn each_bad_shape_maps_to_its_kind() {
    let records = [
        "[1,2,3]",
        r#"{"foo":{"message":"x","sent":"2024-01-01T00:00:00Z"}}"#,
        r#"{"data":null}"#,
        r#"{"error":{"message":"x","sent":"yesterday"}}"#,
    ];
    let mut stream = Streamer::builder()
        .build()
        .unwrap()
        .open(script(&records))
        .unwrap();

    let got = drain(&mut stream).await;
    assert!(got.tweets.is_empty() && got.notices.is_empty());
    assert_eq!(
        kinds(&got.errors),
        [
            Some(DecodeErrorKind::NotAnObject),
            Some(DecodeErrorKind::UnrecognizedEnvelope),
            Some(DecodeErrorKind::InvalidPayload),
            Some(DecodeErrorKind::InvalidTimestamp),
        ]
    );
}

#[tokio::test]
async fn truncated_tail_at_end_of_body_is_one_decode_error() {
    let d1 = fixtures::data_line("1", "a", &[]);
    let source = ScriptedSource::builder()
        .line(&d1)
        .chunk(r#"{"data":{"id":"2","te"#)
        .build();
    let mut stream = Streamer::builder().build().unwrap().open(source).unwrap();

    let got = drain(&mut stream).await;
    assert_eq!(got.tweet_ids(), ["1"]);
    assert_eq!(kinds(&got.errors), [Some(DecodeErrorKind::MalformedJson)]);
}

#[tokio::test]
async fn complete_tail_without_delimiter_is_delivered() {
    let source = ScriptedSource::builder()
        .chunk(fixtures::data_line("9", "last", &[]))
        .build();
    let mut stream = Streamer::builder().build().unwrap().open(source).unwrap();

    let got = drain(&mut stream).await;
    assert_eq!(got.tweet_ids(), ["9"]);
    assert!(got.errors.is_empty());
}

#[tokio::test]
async fn oversized_record_is_skipped_with_one_error() {
    let long = fixtures::data_line("big", &"x".repeat(500), &[]);
    let small = fixtures::data_line("2", "ok", &[]);
    let source = ScriptedSource::builder()
        .chunked(format!("{long}\r\n"), 64)
        .line(&small)
        .build();
    let mut stream = Streamer::builder()
        .max_line_bytes(Some(128))
        .build()
        .unwrap()
        .open(source)
        .unwrap();

    let got = drain(&mut stream).await;
    assert_eq!(got.tweet_ids(), ["2"]);
    assert_eq!(kinds(&got.errors), [Some(DecodeErrorKind::LineTooLong)]);
}

#[tokio::test]
async fn fail_fast_ends_stream_after_first_decode_error() {
    let d1 = fixtures::data_line("1", "a", &[]);
    let d2 = fixtures::data_line("2", "b", &[]);
    let source = ScriptedSource::builder()
        .lines([d1.as_str(), "garbage", d2.as_str()])
        .hold_open()
        .build();
    let probe = source.probe();
    let mut stream = Streamer::builder()
        .decode_error_policy(DecodeErrorPolicy::FailFast)
        .build()
        .unwrap()
        .open(source)
        .unwrap();

    let got = drain(&mut stream).await;
    assert_eq!(got.tweet_ids(), ["1"]);
    assert_eq!(got.errors.len(), 2);
    assert_eq!(got.errors[0].decode_kind(), Some(DecodeErrorKind::MalformedJson));
    assert_eq!(
        got.errors[1],
        StreamError::DecodePolicyExceeded { consecutive: 1 }
    );
    assert!(got.errors[1].is_terminal());

    stream.close().await;
    assert_eq!(probe.release_count(), 1);
}

#[tokio::test]
async fn consecutive_limit_resets_on_good_record() {
    let good = fixtures::data_line("1", "a", &[]);
    let good2 = fixtures::data_line("2", "b", &[]);
    let never = fixtures::data_line("3", "never", &[]);
    let source = script(&["bad1", &good, "bad2", &good2, "bad3", "bad4", &never]);
    let mut stream = Streamer::builder()
        .decode_error_policy(DecodeErrorPolicy::FailAfterConsecutive(2))
        .build()
        .unwrap()
        .open(source)
        .unwrap();

    let got = drain(&mut stream).await;
    assert_eq!(got.tweet_ids(), ["1", "2"]);
    assert_eq!(got.errors.len(), 5);
    assert!(got.errors[..4].iter().all(StreamError::is_decode));
    assert_eq!(
        got.errors[4],
        StreamError::DecodePolicyExceeded { consecutive: 2 }
    );
}
