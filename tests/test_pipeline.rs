use ecsview::cli::{ColorMode, OutputFormat};
use ecsview::render::{RenderOptions, Renderer};

fn options() -> RenderOptions {
    RenderOptions {
        format: OutputFormat::Default,
        color: ColorMode::Never,
        ..RenderOptions::default()
    }
}

fn render_with(opts: RenderOptions, input: &str) -> String {
    let renderer = Renderer::new(opts).expect("renderer should build");
    let mut out = Vec::new();
    renderer
        .render_stream(input.as_bytes(), &mut out)
        .expect("rendering should succeed");
    String::from_utf8(out).expect("output should be UTF-8")
}

const VALID: &str = r#"{"@timestamp":"2021-01-19T22:51:12.142Z","log.level":"info","message":"hello","ecs.version":"1.5.0"}"#;
const VALID_ERROR: &str = r#"{"@timestamp":"2021-01-19T22:51:13.000Z","log.level":"error","message":"boom","ecs.version":"1.5.0"}"#;

#[test]
fn renders_a_valid_record() {
    let output = render_with(options(), &format!("{VALID}\n"));
    assert_eq!(output, "[2021-01-19T22:51:12.142Z]  INFO: hello\n");
}

#[test]
fn non_records_pass_through_unchanged() {
    let input = "plain text\n\n{\"not\": \"ecs\"}\n{broken json\n";
    assert_eq!(render_with(options(), input), input);
}

#[test]
fn strict_mode_suppresses_non_records() {
    let input = format!("plain text\n{VALID}\n{{broken json\n");
    let opts = RenderOptions {
        strict: true,
        ..options()
    };
    assert_eq!(
        render_with(opts, &input),
        "[2021-01-19T22:51:12.142Z]  INFO: hello\n"
    );
}

#[test]
fn lenient_mode_accepts_partial_records() {
    let partial = r#"{"log.level":"info","message":"partial"}"#;
    // Default policy: passthrough.
    assert_eq!(render_with(options(), &format!("{partial}\n")), format!("{partial}\n"));
    // Lenient policy: rendered.
    let opts = RenderOptions {
        lenient: true,
        ..options()
    };
    assert_eq!(render_with(opts, &format!("{partial}\n")), " INFO: partial\n");
}

#[test]
fn level_filter_drops_lower_levels() {
    let opts = RenderOptions {
        level: Some("warn".to_string()),
        ..options()
    };
    let input = format!("{VALID}\n{VALID_ERROR}\n");
    assert_eq!(
        render_with(opts, &input),
        "[2021-01-19T22:51:13.000Z] ERROR: boom\n"
    );
}

#[test]
fn kql_filter_drops_non_matching_records() {
    let opts = RenderOptions {
        kql: Some("message:boom".to_string()),
        ..options()
    };
    let input = format!("{VALID}\n{VALID_ERROR}\nnot json\n");
    assert_eq!(
        render_with(opts, &input),
        "[2021-01-19T22:51:13.000Z] ERROR: boom\nnot json\n"
    );
}

#[test]
fn kql_compile_errors_fail_renderer_construction() {
    let opts = RenderOptions {
        kql: Some("foo and".to_string()),
        ..options()
    };
    let err = Renderer::new(opts).expect_err("bad KQL should fail");
    assert_eq!(err.message, "incomplete boolean operator");
}

#[test]
fn exclude_fields_are_dropped_before_rendering() {
    let input = r#"{"@timestamp":"t","log.level":"info","message":"m","ecs.version":"1.5.0","http":{"request":{"method":"get"}},"keep":1}"#;
    let opts = RenderOptions {
        exclude_fields: vec!["http.request".to_string()],
        ..options()
    };
    let output = render_with(opts, &format!("{input}\n"));
    assert_eq!(output, "[t]  INFO: m\n    keep: 1\n");
}

#[test]
fn include_fields_limit_the_detail_section() {
    let input = r#"{"@timestamp":"t","log.level":"info","message":"m","ecs.version":"1.5.0","a":1,"b":2}"#;
    let opts = RenderOptions {
        include_fields: vec!["b".to_string()],
        ..options()
    };
    assert_eq!(
        render_with(opts, &format!("{input}\n")),
        "[t]  INFO: m\n    b: 2\n"
    );
}

#[test]
fn ecs_format_round_trips_records() {
    let opts = RenderOptions {
        format: OutputFormat::Ecs,
        ..options()
    };
    let input = format!("{VALID}\nplain\n");
    assert_eq!(render_with(opts, &input), input);
}

#[test]
fn records_stay_in_input_order() {
    let input = format!("{VALID_ERROR}\n{VALID}\n");
    let output = render_with(options(), &input);
    let boom = output.find("boom").unwrap();
    let hello = output.find("hello").unwrap();
    assert!(boom < hello);
}

#[test]
fn overlong_lines_stream_through() {
    let long = format!("{{\"message\":\"{}\"}}", "x".repeat(100_000));
    let input = format!("{VALID}\n{long}\n");
    let opts = RenderOptions {
        max_line_len: 1024,
        ..options()
    };
    let output = render_with(opts, &input);
    assert_eq!(
        output,
        format!("[2021-01-19T22:51:12.142Z]  INFO: hello\n{long}\n")
    );
}

#[test]
fn strict_mode_suppresses_overlong_lines() {
    let long = format!("{{\"message\":\"{}\"}}", "x".repeat(100_000));
    let input = format!("{long}\n{VALID}\n");
    let opts = RenderOptions {
        max_line_len: 1024,
        strict: true,
        ..options()
    };
    assert_eq!(
        render_with(opts, &input),
        "[2021-01-19T22:51:12.142Z]  INFO: hello\n"
    );
}

#[test]
fn final_line_without_newline_still_terminates_output() {
    let output = render_with(options(), VALID);
    assert!(output.ends_with('\n'));
}
