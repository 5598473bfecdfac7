use std::time::Duration;

use tweetstream::{DecodeErrorPolicy, StreamConfig, StreamError, Streamer};
use tweetstream_mock::ScriptedSource;

fn invalid_arg(res: Result<Streamer, StreamError>) -> bool {
    matches!(res, Err(StreamError::InvalidArg(_)))
}

#[test]
fn zero_capacities_are_rejected() {
    assert!(invalid_arg(Streamer::builder().data_capacity(0).build()));
    assert!(invalid_arg(Streamer::builder().notice_capacity(0).build()));
    assert!(invalid_arg(Streamer::builder().error_capacity(0).build()));
}

#[test]
fn zero_line_limit_and_zero_consecutive_limit_are_rejected() {
    assert!(invalid_arg(Streamer::builder().max_line_bytes(Some(0)).build()));
    assert!(invalid_arg(
        Streamer::builder()
            .decode_error_policy(DecodeErrorPolicy::FailAfterConsecutive(0))
            .build()
    ));
}

#[test]
fn modifiers_land_in_config() {
    let s = Streamer::builder()
        .data_capacity(8)
        .notice_capacity(4)
        .error_capacity(2)
        .max_line_bytes(None)
        .decode_error_policy(DecodeErrorPolicy::FailFast)
        .close_timeout(Duration::from_millis(250))
        .build()
        .unwrap();
    assert_eq!(
        s.config(),
        &StreamConfig {
            data_capacity: 8,
            notice_capacity: 4,
            error_capacity: 2,
            max_line_bytes: None,
            decode_error_policy: DecodeErrorPolicy::FailFast,
            close_timeout: Duration::from_millis(250),
        }
    );
}

#[test]
fn default_config_builds() {
    let s = Streamer::builder().build().unwrap();
    assert_eq!(s.config(), &StreamConfig::default());
    assert!(Streamer::new(StreamConfig::default()).is_ok());
}

#[test]
fn open_outside_runtime_fails() {
    let s = Streamer::builder().build().unwrap();
    let err = s.open(ScriptedSource::from_body("")).unwrap_err();
    assert!(matches!(err, StreamError::InvalidArg(_)));
}
