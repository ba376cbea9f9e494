//! Streaming pipeline walkthrough: chunking, framing, and delivery.
//!
//! This example shows how to:
//! - Slice model output into word-boundary chunks
//! - Frame a chunk stream as start / chunk* / end events
//! - Encode events into SSE wire frames
//! - Buffer events behind a generator with heartbeats
//! - Replay a pre-built event sequence at a fixed pace
//!
//! # Running
//!
//! ```bash
//! cargo run --example stream_events
//! ```

use futures_util::StreamExt;
use medstream::{
    event_stream, stream_with_delay, word_chunks, SseEvent, SseEventGenerator, SseEventType,
    TargetPanel, DEFAULT_CHUNK_SIZE,
};
use std::time::Duration;

const ANSWER: &str = "Acute coronary syndrome remains the leading concern for this patient";

/// Demonstrates word-boundary chunking of a model answer
fn demonstrate_word_chunking() {
    println!("=== Word-Boundary Chunking ===\n");

    let chunks = word_chunks(ANSWER, DEFAULT_CHUNK_SIZE, 0);

    println!("{} bytes in, {} chunks out:\n", ANSWER.len(), chunks.len());
    for chunk in &chunks {
        println!(
            "  pos {:3}  len {:2}  boundary {:5}  {:?}",
            chunk.position, chunk.length, chunk.is_word_boundary, chunk.content
        );
    }
    println!();
}

/// Demonstrates framing a chunk stream as SSE events
async fn demonstrate_event_pipeline() -> anyhow::Result<()> {
    println!("=== Chunk Stream to SSE Frames ===\n");

    let chunks = word_chunks("Order an ECG and troponins", DEFAULT_CHUNK_SIZE, 0);
    let source = futures_util::stream::iter(chunks.into_iter().map(Ok));

    let mut events = Box::pin(event_stream(source, "stage-plan", TargetPanel::Chat));
    while let Some(event) = events.next().await {
        print!("{}", event.encode()?);
    }

    Ok(())
}

/// Demonstrates buffered delivery with keep-alive heartbeats
async fn demonstrate_buffered_delivery() -> anyhow::Result<()> {
    println!("=== Buffered Delivery with Heartbeats ===\n");

    // Short heartbeat interval so the demo shows one quickly
    let mut generator = SseEventGenerator::new(16, Duration::from_millis(150));

    generator.push(SseEvent::chunk("Reviewing", 0, false, Some("stage-labs")));
    generator.push(SseEvent::chunk("labs", 9, true, Some("stage-labs")));

    println!("Queued {} events; draining:\n", generator.pending());
    for _ in 0..2 {
        if let Some(frame) = generator.next_event().await {
            print!("{frame}");
        }
    }

    println!("Queue idle; the next frame is a keep-alive:\n");
    if let Some(frame) = generator.next_event().await {
        print!("{frame}");
    }

    generator.stop();
    println!("Generator stopped: next_event returns {:?}\n", generator.next_event().await);

    Ok(())
}

/// Demonstrates replaying a fixed event sequence at a steady pace
async fn demonstrate_paced_replay() {
    println!("=== Paced Replay ===\n");

    let events = vec![
        SseEvent::stage(
            SseEventType::Start,
            "stage-summary",
            "Case Summary",
            TargetPanel::Reasoning,
            serde_json::Map::new(),
        ),
        SseEvent::chunk("Summary", 0, false, Some("stage-summary")),
        SseEvent::chunk("ready", 7, true, Some("stage-summary")),
    ];

    let mut frames = Box::pin(stream_with_delay(events, Duration::from_millis(50)));
    while let Some(frame) = frames.next().await {
        print!("{frame}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Section 1: Chunking
    demonstrate_word_chunking();

    // Section 2: Pipeline framing and the wire codec
    demonstrate_event_pipeline().await?;

    // Section 3: Producer/consumer buffering
    demonstrate_buffered_delivery().await?;

    // Section 4: Fixed-pace replay
    demonstrate_paced_replay().await;

    println!("=== Streaming Patterns Summary ===\n");
    println!("1. word_chunks never splits inside a word; positions are byte offsets");
    println!("2. event_stream adds start/end framing and terminates on error");
    println!("3. encode() produces one EventSource-ready frame per event");
    println!("4. SseEventGenerator buffers bursts and heartbeats idle streams");
    println!("5. stream_with_delay paces replayed transcripts for demos and tests");

    Ok(())
}
