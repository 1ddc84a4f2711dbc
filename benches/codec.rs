//! Wire codec benchmark suite.
//!
//! Benchmarks the hot paths of a busy link:
//! - Command encoding
//! - Frame decoding for slot tables of growing size
//! - Display content decoding for common matrix sizes
//!
//! Run with: cargo bench --bench codec
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pixelix_client::Command;
use pixelix_client::protocol::{CommandName, Frame, Outcome, decode_frame, decode_reply};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const SLOT_COUNTS: &[usize] = &[4, 16, 64];
const DISPLAY_SIZES: &[(usize, usize)] = &[(32, 8), (64, 64)];

// ============================================================================
// Fixtures
// ============================================================================

fn slots_frame(count: usize) -> String {
    let mut frame = format!("ACK;{count}");
    for index in 0..count {
        frame.push_str(&format!(";\"Plugin{index}\";{index};\"\";0;0;10000"));
    }
    frame
}

fn display_frame(width: usize, height: usize) -> String {
    let mut frame = format!("ACK;0;{width};{height}");
    for index in 0..width * height {
        frame.push_str(&format!(";{:x}", index * 0x10101 % 0x100_0000));
    }
    frame
}

fn decode_ack(name: CommandName, frame: &str) {
    let Ok(Frame::Outcome(Outcome::Success(fields))) = decode_frame(frame) else {
        panic!("fixture is not a success frame");
    };
    black_box(decode_reply(name, &fields).expect("fixture decodes"));
}

// ============================================================================
// Benchmark: Encoding
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let commands = [
        Command::GetSlots,
        Command::SetBrightness {
            level: 128,
            auto_control: Some(true),
        },
        Command::Install {
            plugin: "ClockPlugin".to_string(),
        },
        Command::SetAlias {
            uid: 42,
            alias: "Kitchen".to_string(),
        },
    ];

    let mut group = c.benchmark_group("encode");
    for command in &commands {
        group.bench_with_input(
            BenchmarkId::from_parameter(command.name()),
            command,
            |b, command| b.iter(|| black_box(command.encode())),
        );
    }
    group.finish();
}

// ============================================================================
// Benchmark: Decoding
// ============================================================================

fn bench_decode_slots(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_slots");

    for &count in SLOT_COUNTS {
        let frame = slots_frame(count);
        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &frame, |b, frame| {
            b.iter(|| decode_ack(CommandName::Slots, frame));
        });
    }

    group.finish();
}

fn bench_decode_display(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_display");

    for &(width, height) in DISPLAY_SIZES {
        let frame = display_frame(width, height);
        group.throughput(Throughput::Elements((width * height) as u64));
        group.bench_with_input(
            BenchmarkId::new("pixels", format!("{width}x{height}")),
            &frame,
            |b, frame| b.iter(|| decode_ack(CommandName::GetDisp, frame)),
        );
    }

    group.finish();
}

fn bench_decode_event(c: &mut Criterion) {
    let frame = "EVT;LOG;123456;3;\"src/Web/WebSocket.cpp\";211;\"Client connected.\"";

    c.bench_function("decode_log_event", |b| {
        b.iter(|| black_box(decode_frame(black_box(frame)).expect("fixture decodes")));
    });
}

// ============================================================================
// Main
// ============================================================================

criterion_group!(
    benches,
    bench_encode,
    bench_decode_slots,
    bench_decode_display,
    bench_decode_event
);
criterion_main!(benches);
