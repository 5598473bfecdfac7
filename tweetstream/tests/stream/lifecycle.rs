use std::time::Duration;

use futures::future::join_all;
use tweetstream::{StreamState, Streamer};
use tweetstream_mock::{ManualSource, ScriptedSource, fixtures};

use crate::helpers::{WAIT, drain, eventually};

fn held_open_with(n: usize) -> ScriptedSource {
    (0..n)
        .fold(ScriptedSource::builder(), |b, i| {
            b.line(&fixtures::data_line(&i.to_string(), "t", &[]))
        })
        .hold_open()
        .build()
}

#[tokio::test]
async fn close_while_dispatcher_blocked_on_full_channel() {
    let source = held_open_with(5);
    let probe = source.probe();
    let mut stream = Streamer::builder()
        .data_capacity(1)
        .build()
        .unwrap()
        .open(source)
        .unwrap();

    // One record fits in the channel; the dispatcher is now parked on the second.
    let stats_ready = {
        let closer = stream.closer();
        eventually(move || closer.stats().data_messages >= 2).await
    };
    assert!(stats_ready);
    assert_eq!(stream.state(), StreamState::Open);

    tokio::time::timeout(WAIT, stream.close())
        .await
        .expect("close must not hang on a blocked send");
    assert_eq!(stream.state(), StreamState::Closed);
    assert!(stream.is_finished());
    assert_eq!(probe.release_count(), 1);

    // The buffered record is still receivable, then the channel reports closed.
    let got = drain(&mut stream).await;
    assert_eq!(got.tweet_ids(), ["0"]);
    assert!(got.errors.is_empty(), "close must not report an error");
}

#[tokio::test]
async fn close_while_waiting_for_bytes() {
    let (feed, source) = ManualSource::new();
    let probe = source.probe();
    let mut stream = Streamer::builder().build().unwrap().open(source).unwrap();

    assert!(feed.line(&fixtures::data_line("1", "a", &[])));
    let first = tokio::time::timeout(WAIT, stream.tweets().recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.tweets[0].id, "1");

    tokio::time::timeout(WAIT, stream.close()).await.unwrap();
    assert_eq!(stream.state(), StreamState::Closed);
    assert!(feed.is_closed());
    assert_eq!(probe.release_count(), 1);
    assert!(stream.tweets().recv().await.is_none());
    assert!(stream.notices().recv().await.is_none());
    assert!(stream.errors().recv().await.is_none());
}

#[tokio::test]
async fn close_is_idempotent() {
    let source = held_open_with(0);
    let probe = source.probe();
    let stream = Streamer::builder().build().unwrap().open(source).unwrap();

    stream.close().await;
    stream.close().await;
    stream.closer().close().await;
    assert_eq!(stream.state(), StreamState::Closed);
    assert_eq!(probe.release_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_closes_all_return_after_exit() {
    let source = held_open_with(3);
    let probe = source.probe();
    let stream = Streamer::builder()
        .data_capacity(1)
        .build()
        .unwrap()
        .open(source)
        .unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let closer = stream.closer();
            tokio::spawn(async move {
                closer.close().await;
                closer.state()
            })
        })
        .collect();

    let states = tokio::time::timeout(WAIT, join_all(tasks)).await.unwrap();
    for state in states {
        assert_eq!(state.unwrap(), StreamState::Closed);
    }
    assert_eq!(probe.release_count(), 1);
}

#[tokio::test]
async fn close_after_end_of_body_is_a_no_op() {
    let source = ScriptedSource::builder()
        .line(&fixtures::data_line("1", "a", &[]))
        .build();
    let probe = source.probe();
    let mut stream = Streamer::builder().build().unwrap().open(source).unwrap();

    let got = drain(&mut stream).await;
    assert_eq!(got.tweet_ids(), ["1"]);
    stream.close().await;
    assert_eq!(stream.state(), StreamState::Closed);
    assert_eq!(probe.release_count(), 1);
}

#[tokio::test]
async fn zero_close_timeout_aborts_dispatcher() {
    let source = held_open_with(0);
    let probe = source.probe();
    let stream = Streamer::builder()
        .close_timeout(Duration::ZERO)
        .build()
        .unwrap()
        .open(source)
        .unwrap();

    tokio::time::timeout(WAIT, stream.close()).await.unwrap();
    assert_eq!(stream.state(), StreamState::Closed);
    assert_eq!(probe.release_count(), 1);
}

#[tokio::test]
async fn dropping_handle_without_close_releases_body() {
    let source = held_open_with(1);
    let probe = source.probe();
    let stream = Streamer::builder().build().unwrap().open(source).unwrap();
    drop(stream);

    assert!(eventually(|| probe.released()).await);
    assert_eq!(probe.release_count(), 1);
}

#[tokio::test]
async fn events_stream_ends_after_close() {
    use futures::StreamExt;

    let (feed, source) = ManualSource::new();
    let stream = Streamer::builder().build().unwrap().open(source).unwrap();
    let closer = stream.closer();
    let mut events = Box::pin(stream.into_events());

    feed.line(&fixtures::notice_line(
        "disconnect",
        "operator closed the connection",
        "2024-03-03T03:03:03Z",
    ));
    let first = tokio::time::timeout(WAIT, events.next()).await.unwrap();
    assert!(matches!(first, Some(tweetstream::StreamEvent::Notice(_))));

    closer.close().await;
    assert!(events.next().await.is_none());
    assert_eq!(closer.state(), StreamState::Closed);
}

#[tokio::test]
async fn close_while_dispatcher_blocked_on_full_notice_channel() {
    let source = (0..4)
        .fold(ScriptedSource::builder(), |b, i| {
            b.line(&fixtures::notice_line(
                "info",
                &format!("notice {i}"),
                "2024-01-01T00:00:00Z",
            ))
        })
        .hold_open()
        .build();
    let probe = source.probe();
    let mut stream = Streamer::builder()
        .notice_capacity(1)
        .build()
        .unwrap()
        .open(source)
        .unwrap();

    let closer = stream.closer();
    assert!(eventually(move || closer.stats().notices >= 2).await);

    tokio::time::timeout(WAIT, stream.close())
        .await
        .expect("close must not hang on a blocked notice send");
    assert_eq!(stream.state(), StreamState::Closed);
    assert_eq!(probe.release_count(), 1);

    let got = drain(&mut stream).await;
    assert_eq!(got.notice_messages(), ["notice 0"]);
    assert!(got.errors.is_empty());
}

#[tokio::test]
async fn close_while_dispatcher_blocked_on_full_error_channel() {
    let source = ScriptedSource::builder()
        .lines(["bad 1", "bad 2", "bad 3", "bad 4"])
        .hold_open()
        .build();
    let probe = source.probe();
    let mut stream = Streamer::builder()
        .error_capacity(1)
        .build()
        .unwrap()
        .open(source)
        .unwrap();

    let closer = stream.closer();
    assert!(eventually(move || closer.stats().decode_errors >= 2).await);

    tokio::time::timeout(WAIT, stream.close())
        .await
        .expect("close must not hang on a blocked error send");
    assert_eq!(stream.state(), StreamState::Closed);
    assert_eq!(probe.release_count(), 1);

    let got = drain(&mut stream).await;
    assert_eq!(got.errors.len(), 1);
    assert!(got.errors[0].is_decode());
}
