//! Canned stream records.

use chrono::{DateTime, FixedOffset};
use serde_json::json;
use tweetstream_core::{DataMessage, MatchingRule, NoticeBody, NoticeKind, SystemNotice, Tweet};

/// First forced-disconnect message used by the recorded stream.
pub const FORCED_DISCONNECT: &str =
    "Forced Disconnect: Too many connections. (Allowed Connections = 2)";
/// Query parameter error message used by the recorded stream.
pub const INVALID_DATE: &str = "Invalid date format for query parameter 'fromDate'. Expected format is 'yyyyMMddHHmm'. For example, '201701012315' for January 1st, 11:15 pm 2017 UTC.\n\n";
/// Buffer overflow message used by the recorded stream.
pub const BACKUP_FULL: &str =
    "Force closing connection to because it reached the maximum allowed backup (buffer size is ).";

/// A recorded sample stream: three tweets, three error notices, four
/// consecutive keep-alives, CRLF delimiters, and no delimiter after the
/// final record.
#[must_use]
pub fn recorded_stream() -> String {
    let mut stream = String::new();
    stream.push_str(r#"{"data":{"id":"1","text":"hello"}, "matching_rules": [{ "id": "rule 1", "tag": "rule tag 1" }]}"#);
    stream.push_str("\r\n");
    stream.push_str(&notice_line("error", FORCED_DISCONNECT, "2017-01-11T18:12:52+00:00"));
    stream.push_str("\r\n");
    stream.push_str(r#"{"data":{"id":"2","text":"world"}, "matching_rules": [{ "id": "rule 2", "tag": "rule tag 2" }]}"#);
    stream.push_str("\r\n\r\n\r\n\r\n");
    stream.push_str(r#"{"data":{"id":"3","text":"!!"}}"#);
    stream.push_str("\r\n");
    stream.push_str(&notice_line("error", INVALID_DATE, "2017-01-11T17:04:13+00:00"));
    stream.push_str("\r\n");
    stream.push_str(&notice_line("error", BACKUP_FULL, "2017-01-11T17:04:13+00:00"));
    stream
}

/// Data messages expected from [`recorded_stream`], in order.
#[must_use]
pub fn recorded_tweets() -> Vec<DataMessage> {
    vec![
        DataMessage::new(
            vec![Tweet::new("1", "hello")],
            vec![MatchingRule::new("rule 1", "rule tag 1")],
        ),
        DataMessage::new(
            vec![Tweet::new("2", "world")],
            vec![MatchingRule::new("rule 2", "rule tag 2")],
        ),
        DataMessage::new(vec![Tweet::new("3", "!!")], Vec::new()),
    ]
}

/// System notices expected from [`recorded_stream`], in order.
#[must_use]
pub fn recorded_notices() -> Vec<SystemNotice> {
    [
        (FORCED_DISCONNECT, "2017-01-11T18:12:52+00:00"),
        (INVALID_DATE, "2017-01-11T17:04:13+00:00"),
        (BACKUP_FULL, "2017-01-11T17:04:13+00:00"),
    ]
    .into_iter()
    .map(|(message, sent)| {
        SystemNotice::new(
            NoticeKind::Error,
            NoticeBody {
                message: message.to_string(),
                sent: rfc3339(sent),
            },
        )
    })
    .collect()
}

/// One data record with a single tweet and the given `(id, tag)` rules.
#[must_use]
pub fn data_line(id: &str, text: &str, rules: &[(&str, &str)]) -> String {
    let rules: Vec<_> = rules
        .iter()
        .map(|(id, tag)| json!({ "id": id, "tag": tag }))
        .collect();
    if rules.is_empty() {
        json!({ "data": { "id": id, "text": text } }).to_string()
    } else {
        json!({ "data": { "id": id, "text": text }, "matching_rules": rules }).to_string()
    }
}

/// One notice record under the wire field `field`.
#[must_use]
pub fn notice_line(field: &str, message: &str, sent: &str) -> String {
    json!({ field: { "message": message, "sent": sent } }).to_string()
}

/// Parse an RFC 3339 timestamp used in fixtures.
///
/// # Panics
/// Panics on a malformed fixture timestamp.
#[must_use]
pub fn rfc3339(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).expect("fixture timestamp is valid rfc3339")
}
