use beacon::encoder::{decode_batch, encode_batch, encode_event};
use beacon::pipeline::normalizer::{normalize, NormalizeContext, RawEvent};
use beacon::{EventRecord, EventType, Identity, Properties};
use serde_json::{json, Value};

fn sample_record() -> EventRecord {
    let props = Properties::new()
        .with("From", "Baidu")
        .with("Count", 3)
        .with("Ratio", 0.25)
        .with("Tags", vec!["a", "b"]);
    let identity = Identity::login("user_1").with("$identity_mobile", "13800000000");
    let mut raw = RawEvent::new(EventType::Track, &props);
    raw.distinct_id = Some("user_1");
    raw.event = Some("Test");
    raw.identities = Some(&identity);
    let ctx = NormalizeContext {
        now_millis: 1_437_816_376_000,
        project: Some("default"),
        ..NormalizeContext::default()
    };
    normalize(&raw, &ctx).unwrap()
}

#[test]
fn test_event_round_trip() {
    let record = sample_record();
    let line = encode_event(&record).unwrap();
    assert!(!line.contains('\n'));

    let decoded: EventRecord = serde_json::from_str(&line).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn test_wire_shape() {
    let wire: Value = serde_json::from_str(&encode_event(&sample_record()).unwrap()).unwrap();

    assert_eq!(wire["type"], json!("track"));
    assert_eq!(wire["event"], json!("Test"));
    assert_eq!(wire["time"], json!(1_437_816_376_000_i64));
    assert_eq!(wire["project"], json!("default"));
    assert_eq!(wire["identities"]["$identity_login_id"], json!("user_1"));
    assert_eq!(wire["lib"]["$lib"], json!("Rust"));
    assert_eq!(wire["lib"]["$lib_method"], json!("code"));
    assert!(wire.get("original_id").is_none(), "absent fields are skipped");
    assert!(wire.get("item_id").is_none());
}

#[test]
fn test_newlines_inside_values_are_escaped() {
    let props = Properties::new().with("Note", "line one\nline two");
    let mut raw = RawEvent::new(EventType::ProfileSet, &props);
    raw.distinct_id = Some("1234");
    let ctx = NormalizeContext {
        now_millis: 1_437_816_376_000,
        ..NormalizeContext::default()
    };
    let line = encode_event(&normalize(&raw, &ctx).unwrap()).unwrap();
    assert!(!line.contains('\n'));
}

#[test]
fn test_batch_envelope_keeps_order() {
    let messages: Vec<String> = (0..5).map(|i| format!("{{\"seq\":{i}}}")).collect();
    let envelope = encode_batch(&messages).unwrap();

    assert!(!envelope.contains('['), "envelope is base64, not raw json");
    let decoded = decode_batch(&envelope).unwrap();
    let seqs: Vec<i64> = decoded.iter().map(|v| v["seq"].as_i64().unwrap()).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_batch_envelope_is_gzip() {
    use base64::Engine;
    let envelope = encode_batch(&["{}".to_string()]).unwrap();
    let bytes = base64::engine::general_purpose::STANDARD.decode(envelope).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b], "gzip magic header");
}

#[test]
fn test_empty_batch_is_empty_array() {
    let envelope = encode_batch(&[]).unwrap();
    assert!(decode_batch(&envelope).unwrap().is_empty());
}
