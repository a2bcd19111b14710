use bytes::Bytes;
use futures::{stream, StreamExt};
use planchat::api::stream::{decode_stream, ByteStream, RecordDecoder};
use planchat::error::TransportError;
use planchat::types::{ChatEvent, Step, StepId, StepState};

const SCENARIO: &str = concat!(
    "data: {\"type\":\"status\",\"message\":\"thinking\"}\n",
    "data: {\"type\":\"todo_list\",\"user_intent\":\"book flight\",\"todos\":[{\"id\":1,\"task\":\"search flights\"}]}\n",
    "data: {\"type\":\"todo_update\",\"id\":1,\"status\":\"done\"}\n",
    "data: {\"type\":\"reply\",\"content\":\"Done!\"}\n",
    "data: {\"type\":\"done\"}\n",
);

fn scenario_events() -> Vec<ChatEvent> {
    vec![
        ChatEvent::Status {
            message: "thinking".to_string(),
        },
        ChatEvent::PlanAnnounced {
            intent: "book flight".to_string(),
            steps: vec![Step::pending(1, "search flights")],
        },
        ChatEvent::StepUpdate {
            step_id: StepId::Number(1),
            state: StepState::Done,
        },
        ChatEvent::Reply {
            content: "Done!".to_string(),
        },
        ChatEvent::StreamEnd,
    ]
}

fn decode_chunks<C: AsRef<[u8]>>(chunks: &[C]) -> Vec<ChatEvent> {
    let mut decoder = RecordDecoder::new();
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(decoder.process(chunk.as_ref()));
    }
    events.extend(decoder.finish());
    events
}

fn byte_stream(items: Vec<Result<&'static str, TransportError>>) -> ByteStream {
    let items: Vec<Result<Bytes, TransportError>> = items
        .into_iter()
        .map(|item| item.map(|text| Bytes::from_static(text.as_bytes())))
        .collect();
    Box::pin(stream::iter(items))
}

#[test]
fn test_scenario_decodes_to_expected_events() {
    assert_eq!(decode_chunks(&[SCENARIO.as_bytes()]), scenario_events());
}

#[test]
fn test_fragmented_record() {
    let mut decoder = RecordDecoder::new();

    let events1 = decoder.process(b"data: {\"type\":\"reply\",\"cont");
    assert_eq!(events1.len(), 0);

    let events2 = decoder.process(b"ent\":\"hi\"}\n");
    assert_eq!(
        events2,
        vec![ChatEvent::Reply {
            content: "hi".to_string()
        }]
    );
    assert!(decoder.finish().is_empty());
}

#[test]
fn test_every_two_way_split_decodes_identically() {
    let bytes = SCENARIO.as_bytes();
    let expected = scenario_events();
    for split in 0..=bytes.len() {
        let (head, tail) = bytes.split_at(split);
        assert_eq!(decode_chunks(&[head, tail]), expected, "split at {split}");
    }
}

#[test]
fn test_three_way_splits_decode_identically() {
    let bytes = SCENARIO.as_bytes();
    let expected = scenario_events();
    for first in (0..=bytes.len()).step_by(5) {
        for second in (first..=bytes.len()).step_by(7) {
            let chunks = [&bytes[..first], &bytes[first..second], &bytes[second..]];
            assert_eq!(
                decode_chunks(&chunks),
                expected,
                "splits at {first} and {second}"
            );
        }
    }
}

#[test]
fn test_byte_at_a_time_decodes_identically() {
    let chunks: Vec<&[u8]> = SCENARIO.as_bytes().chunks(1).collect();
    assert_eq!(decode_chunks(&chunks), scenario_events());
}

#[test]
fn test_split_at_prefix_boundary_mid_json_and_across_chunks() {
    let record: &[u8] = b"data: {\"type\":\"reply\",\"content\":\"hi\"}\n";
    let expected = vec![ChatEvent::Reply {
        content: "hi".to_string(),
    }];

    assert_eq!(decode_chunks(&[&record[..6], &record[6..]]), expected);
    assert_eq!(decode_chunks(&[&record[..3], &record[3..]]), expected);
    assert_eq!(decode_chunks(&[&record[..20], &record[20..]]), expected);
    assert_eq!(
        decode_chunks(&[&record[..4], &record[4..11], &record[11..30], &record[30..]]),
        expected
    );
}

#[test]
fn test_multibyte_character_split_across_chunks() {
    let record = "data: {\"type\":\"reply\",\"content\":\"你好\"}\n".as_bytes();
    let expected = vec![ChatEvent::Reply {
        content: "你好".to_string(),
    }];
    let inside_char = record.iter().position(|b| *b >= 0x80).unwrap() + 1;
    assert_eq!(
        decode_chunks(&[&record[..inside_char], &record[inside_char..]]),
        expected
    );
}

#[test]
fn test_malformed_record_is_skipped_and_decoding_continues() {
    let events = decode_chunks(&[
        "data: {not json}\n",
        "data: {\"type\":\"reply\"}\n",
        "data: {\"type\":\"reply\",\"content\":\"after\"}\n",
    ]);
    assert_eq!(
        events,
        vec![ChatEvent::Reply {
            content: "after".to_string()
        }]
    );
}

#[test]
fn test_non_record_lines_are_ignored() {
    let events = decode_chunks(&[
        "\n: keep-alive\nevent: message\nid: 7\ndata:{\"type\":\"done\"}\n\n",
        "data: {\"type\":\"status\",\"message\":\"ok\"}\n\n",
    ]);
    assert_eq!(
        events,
        vec![ChatEvent::Status {
            message: "ok".to_string()
        }]
    );
}

#[test]
fn test_unknown_record_type_is_ignored() {
    let events = decode_chunks(&[
        "data: {\"type\":\"usage\",\"tokens\":12}\n",
        "data: {\"type\":\"done\"}\n",
    ]);
    assert_eq!(events, vec![ChatEvent::StreamEnd]);
}

#[test]
fn test_string_step_ids_are_supported() {
    let events = decode_chunks(&[
        "data: {\"type\":\"todo_update\",\"id\":\"fetch\",\"status\":\"running\"}\n",
    ]);
    assert_eq!(
        events,
        vec![ChatEvent::StepUpdate {
            step_id: StepId::from("fetch"),
            state: StepState::Running,
        }]
    );
}

#[tokio::test]
async fn test_decode_stream_flushes_final_unterminated_record() {
    let source = byte_stream(vec![
        Ok("data: {\"type\":\"reply\",\"content\":\"a\"}\n\ndata: {\"type\":"),
        Ok("\"done\"}"),
    ]);
    let events: Vec<_> = decode_stream(source).collect().await;

    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], Ok(ChatEvent::Reply { content }) if content == "a"));
    assert!(matches!(&events[1], Ok(ChatEvent::StreamEnd)));
}

#[tokio::test]
async fn test_decode_stream_surfaces_transport_error_distinct_from_end() {
    let source = byte_stream(vec![
        Ok("data: {\"type\":\"status\",\"message\":\"working\"}\n"),
        Ok("data: {\"type\":\"reply\",\"content\":\"trunc"),
        Err(TransportError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed",
        ))),
    ]);
    let events: Vec<_> = decode_stream(source).collect().await;

    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], Ok(ChatEvent::Status { message }) if message == "working"));
    assert!(matches!(&events[1], Err(TransportError::Io(_))));
}

#[tokio::test]
async fn test_decode_stream_of_empty_body_ends_cleanly() {
    let events: Vec<_> = decode_stream(byte_stream(vec![])).collect().await;
    assert!(events.is_empty());
}
