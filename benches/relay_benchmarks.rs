//! Per-frame hot path benchmarks for CallBridge Gateway
//!
//! Run with: cargo bench
//! Or for specific benchmarks: cargo bench -- <filter>

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use callbridge_gateway::core::codec::{self, AudioCaptureBuffer};
use callbridge_gateway::core::realtime::SpeechServiceEvent;
use callbridge_gateway::core::session::CallSession;
use callbridge_gateway::core::telephony::{ProviderEvent, ProviderOutbound};

/// 20 ms of µ-law audio at 8 kHz
const FRAME_BYTES: usize = 160;

fn media_frame(payload: &str) -> String {
    format!(
        r#"{{"event":"media","sequenceNumber":"4","streamSid":"MZ1","media":{{"track":"inbound","chunk":"2","timestamp":"40","payload":"{payload}"}}}}"#
    )
}

fn audio_delta(payload: &str) -> String {
    format!(
        r#"{{"type":"response.audio.delta","event_id":"ev_1","response_id":"resp_1","item_id":"item_1","output_index":0,"content_index":0,"delta":"{payload}"}}"#
    )
}

fn bench_frame_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_parsing");
    group.measurement_time(Duration::from_secs(5));

    let payload = codec::encode(&[0x7f; FRAME_BYTES]);
    let media = media_frame(&payload);
    let delta = audio_delta(&payload);
    let mark = r#"{"event":"mark","streamSid":"MZ1","mark":{"name":"mark-1"}}"#;
    let transcript = r#"{"type":"response.audio_transcript.delta","delta":"Hello"}"#;

    group.throughput(Throughput::Bytes(media.len() as u64));
    group.bench_with_input(BenchmarkId::new("provider_media", media.len()), &media, |b, msg| {
        b.iter(|| ProviderEvent::parse(black_box(msg)));
    });

    group.throughput(Throughput::Bytes(mark.len() as u64));
    group.bench_with_input(BenchmarkId::new("provider_mark", mark.len()), &mark, |b, msg| {
        b.iter(|| ProviderEvent::parse(black_box(msg)));
    });

    group.throughput(Throughput::Bytes(delta.len() as u64));
    group.bench_with_input(BenchmarkId::new("speech_audio_delta", delta.len()), &delta, |b, msg| {
        b.iter(|| SpeechServiceEvent::decode(black_box(msg)));
    });

    group.throughput(Throughput::Bytes(transcript.len() as u64));
    group.bench_with_input(
        BenchmarkId::new("speech_unrecognized", transcript.len()),
        &transcript,
        |b, msg| {
            b.iter(|| SpeechServiceEvent::decode(black_box(msg)));
        },
    );

    group.finish();
}

fn bench_outbound_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("outbound_serialization");

    let payload = codec::encode(&[0x7f; FRAME_BYTES]);
    let media = ProviderOutbound::media("MZ1", payload);
    let mark = ProviderOutbound::mark("MZ1", "mark-1");

    group.bench_function("media", |b| b.iter(|| black_box(&media).to_json()));
    group.bench_function("mark", |b| b.iter(|| black_box(&mark).to_json()));

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    for frames in [1usize, 50] {
        let bytes = vec![0x55u8; FRAME_BYTES * frames];
        let encoded = codec::encode(&bytes);

        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("encode", frames), &bytes, |b, bytes| {
            b.iter(|| codec::encode(black_box(bytes)));
        });
        group.bench_with_input(BenchmarkId::new("decode", frames), &encoded, |b, encoded| {
            b.iter(|| codec::decode(black_box(encoded)));
        });
    }

    // One minute of caller audio
    group.bench_function("capture_one_minute", |b| {
        let chunk = [0x55u8; FRAME_BYTES];
        b.iter(|| {
            let mut buffer = AudioCaptureBuffer::new();
            for _ in 0..3000 {
                buffer.append(black_box(&chunk));
            }
            buffer.into_container()
        });
    });

    group.finish();
}

fn bench_session_bookkeeping(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");

    group.bench_function("delta_then_ack", |b| {
        let mut session = CallSession::new();
        session.start("MZ1", None);
        b.iter(|| {
            let ticket = session.record_audio_delta(black_box("item_1"), Some(40));
            session.acknowledge_mark();
            ticket
        });
    });

    group.bench_function("barge_in_after_burst", |b| {
        b.iter(|| {
            let mut session = CallSession::new();
            session.start("MZ1", None);
            for _ in 0..50 {
                session.record_audio_delta("item_1", None);
            }
            session.take_interruption()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_parsing,
    bench_outbound_serialization,
    bench_codec,
    bench_session_bookkeeping,
);
criterion_main!(benches);
