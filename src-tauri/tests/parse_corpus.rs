use dostman_lib::document::parse_document;
use pretty_assertions::assert_eq;

// (input, compact serialization of the parsed value)
fn corpus() -> Vec<(String, String)> {
    let depth = 1000;
    vec![
        (
            r#"{"n": 1e400, "neg": -0, "big": 123456789012345678901234567890, "frac": 1.0000000000000000000001}"#.to_string(),
            r#"{"n":1e400,"neg":-0,"big":123456789012345678901234567890,"frac":1.0000000000000000000001}"#.to_string(),
        ),
        (
            r#"["\"\\\/\b\f\n\r\t\u00e9\ud83d\ude00"]"#.to_string(),
            "[\"\\\"\\\\/\\b\\f\\n\\r\\t\u{e9}\u{1f600}\"]".to_string(),
        ),
        (
            r#"["\ud800", "x\udfffy", "\\ud800"]"#.to_string(),
            "[\"\u{fffd}\",\"x\u{fffd}y\",\"\\\\ud800\"]".to_string(),
        ),
        (
            "{ \"\u{e9}\" : [ 1 , true , null ] ,\n\t\"a\":{} }".to_string(),
            "{\"\u{e9}\":[1,true,null],\"a\":{}}".to_string(),
        ),
        (
            r#"{"a": 1, "b": [2], "a": 3}"#.to_string(),
            r#"{"a":3,"b":[2]}"#.to_string(),
        ),
        (
            format!("{}{}", "[".repeat(depth), "]".repeat(depth)),
            format!("{}{}", "[".repeat(depth), "]".repeat(depth)),
        ),
        (
            format!("{}null{}", r#"{"a": "#.repeat(depth), "}".repeat(depth)),
            format!("{}null{}", r#"{"a":"#.repeat(depth), "}".repeat(depth)),
        ),
    ]
}

#[test]
fn corpus_round_trips_through_the_parser() {
    for (input, expected) in corpus() {
        let doc = parse_document(&input).unwrap();
        let compact = serde_json::to_string(&doc.value).unwrap();
        assert_eq!(compact, expected);

        let again = parse_document(&compact).unwrap();
        assert_eq!(serde_json::to_string(&again.value).unwrap(), expected);
    }
}

#[test]
fn corpus_spans_stay_on_char_boundaries() {
    for (input, _) in corpus() {
        let doc = parse_document(&input).unwrap();
        for span in doc.index.spans() {
            assert!(span.start <= span.end && span.end <= input.len());
            assert!(input.is_char_boundary(span.start) && input.is_char_boundary(span.end));
        }
    }
}
