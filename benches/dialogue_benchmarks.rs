//! Performance benchmarks for the booking dialogue
//!
//! Run with: cargo bench
//! Or for specific benchmarks: cargo bench -- <filter>

use appointment_gateway::core::dialogue::{CallInput, Dialogue};
use appointment_gateway::core::storage::blob_name;
use appointment_gateway::core::twiml::escape_xml;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::time::Duration;

const ACTION_PATH: &str = "/api/call-handler";

/// Benchmark webhook input parsing
fn bench_input_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("input_parsing");
    group.measurement_time(Duration::from_secs(5));

    let short_body = "SpeechResult=Alex&CallSid=CA123&AccountSid=AC456";
    let long_body = format!(
        "SpeechResult={}&CallSid=CA123&name=Alex&date=Monday",
        "word+".repeat(200)
    );
    let query = "step=got_time&name=Alex+Smith&date=next+Monday";

    for (label, body) in [("short", short_body.to_string()), ("long", long_body)] {
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::new(label, body.len()), &body, |b, body| {
            b.iter(|| CallInput::from_request(black_box(body.as_bytes()), black_box(Some(query))));
        });
    }

    group.finish();
}

/// Benchmark full turns: parse, transition, render TwiML
fn bench_dialogue_turns(c: &mut Criterion) {
    let mut group = c.benchmark_group("dialogue_turns");
    let dialogue = Dialogue::default();

    let turns = [
        ("entry", "", None),
        ("got_name", "SpeechResult=Alex+Smith", Some("step=got_name")),
        (
            "got_time",
            "SpeechResult=3pm",
            Some("step=got_time&name=Alex&date=Monday"),
        ),
        (
            "confirm",
            "SpeechResult=yes+please",
            Some("step=confirm&name=Alex&date=Monday&time=3pm"),
        ),
        ("unknown", "", Some("step=banana")),
    ];

    for (label, body, query) in turns {
        group.bench_function(label, |b| {
            b.iter(|| {
                let input = CallInput::from_request(black_box(body.as_bytes()), black_box(query));
                dialogue.respond(&input).to_twiml(ACTION_PATH, "en-US")
            });
        });
    }

    group.finish();
}

/// Benchmark escaping and blob naming of reply text
fn bench_reply_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("reply_text");

    let plain = "Sure, I can book you in for Tuesday at 3pm. ".repeat(5);
    let markup = "<Tom> & \"Jerry's\" ".repeat(20);

    group.bench_function("escape_plain", |b| b.iter(|| escape_xml(black_box(&plain))));
    group.bench_function("escape_markup", |b| b.iter(|| escape_xml(black_box(&markup))));
    group.bench_function("blob_name", |b| b.iter(|| blob_name(black_box(&plain))));

    group.finish();
}

criterion_group!(
    benches,
    bench_input_parsing,
    bench_dialogue_turns,
    bench_reply_text
);
criterion_main!(benches);
