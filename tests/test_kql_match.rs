use ecsview::kql::compile;
use ecsview::levels::log_level_less;
use serde_json::{Value, json};

struct MatchCase {
    name: &'static str,
    kql: &'static str,
    rec: Value,
    matches: bool,
}

fn match_cases() -> Vec<MatchCase> {
    vec![
        MatchCase {
            name: "empty KQL matches all",
            kql: "",
            rec: json!({"foo": "bar"}),
            matches: true,
        },
        MatchCase {
            name: "exists query",
            kql: "foo:*",
            rec: json!({"foo": "bar"}),
            matches: true,
        },
        MatchCase {
            name: "exists query: false",
            kql: "baz:*",
            rec: json!({"foo": "bar"}),
            matches: false,
        },
        MatchCase {
            name: "terms query",
            kql: "foo:bar",
            rec: json!({"foo": "bar"}),
            matches: true,
        },
        MatchCase {
            name: "terms query: false",
            kql: "foo:baz",
            rec: json!({"foo": "bar"}),
            matches: false,
        },
        MatchCase {
            name: "terms query: multiple values",
            kql: "foo: bar baz",
            rec: json!({"foo": "baz"}),
            matches: true,
        },
        MatchCase {
            name: "number term matches in scientific notation",
            kql: "foo:4.2e1",
            rec: json!({"foo": 42}),
            matches: true,
        },
        MatchCase {
            name: "plain terms query does not match into arrays",
            kql: "foo:1",
            rec: json!({"foo": [1, 2, 3]}),
            matches: false,
        },
        MatchCase {
            name: "match-all terms over an array field",
            kql: "tags:(success and info and security)",
            rec: json!({"tags": ["a", "success", "security", "info"]}),
            matches: true,
        },
        MatchCase {
            name: "log.level range with the reference comparator",
            kql: "log.level > info",
            rec: json!({"log.level": "error"}),
            matches: true,
        },
        MatchCase {
            name: "log.level range drops lower levels",
            kql: "log.level >= info",
            rec: json!({"log.level": "debug"}),
            matches: false,
        },
        MatchCase {
            name: "wildcard term",
            kql: "http.response.status_code:5*",
            rec: json!({"http": {"response": {"status_code": "503"}}}),
            matches: true,
        },
        MatchCase {
            name: "bare terms match the message field",
            kql: "timeout",
            rec: json!({"message": "timeout"}),
            matches: true,
        },
        MatchCase {
            name: "bare terms do not match other fields",
            kql: "timeout",
            rec: json!({"error": {"message": "timeout"}}),
            matches: false,
        },
        MatchCase {
            name: "boolean composition",
            kql: "foo:bar and not baz:*",
            rec: json!({"foo": "bar"}),
            matches: true,
        },
        MatchCase {
            name: "dotted query against nested record",
            kql: "log.origin.file.name:main.rs",
            rec: json!({"log": {"origin": {"file": {"name": "main.rs"}}}}),
            matches: true,
        },
    ]
}

#[test]
fn match_table() {
    for case in match_cases() {
        let filter = compile(case.kql, Some(log_level_less))
            .unwrap_or_else(|err| panic!("{}: compile failed:\n{err}", case.name));
        assert_eq!(
            filter.matches(&case.rec),
            case.matches,
            "{}:\nkql:\n\t{}\nrec:\n\t{}",
            case.name,
            case.kql,
            case.rec
        );
    }
}

#[test]
fn lookup_and_extract_round_trip() {
    use ecsview::lookup::{extract_value, lookup_value};

    let mut rec = json!({"a": {"b": {"c": "d"}}});
    assert_eq!(lookup_value(&rec, &["a", "b", "c"]), Some(&json!("d")));
    assert_eq!(extract_value(&mut rec, &["a", "b", "c"]), Some(json!("d")));
    assert_eq!(rec, json!({}));
}

#[test]
fn compile_error_points_at_the_offending_byte() {
    let err = compile("(foo and", Some(log_level_less)).unwrap_err();
    assert_eq!(err.offset, 8);
    assert_eq!(
        err.to_string(),
        "unclosed open parenthesis\n    (foo and\n    ........^"
    );
}

#[test]
fn filters_are_shareable_across_threads() {
    let filter = compile("log.level >= warn", Some(log_level_less)).unwrap();
    let filter = std::sync::Arc::new(filter);
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let filter = filter.clone();
            std::thread::spawn(move || {
                let rec = json!({"log.level": "error", "n": i});
                filter.matches(&rec)
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
