//! Registry benchmark suite.
//!
//! Benchmarks registry operations at different scales over an in-memory
//! transport, so the numbers reflect the pool itself and not the network:
//! - Client counts: 10, 100, 1000
//! - Churn: add then remove every client
//! - Fan-in: drain a fixed number of frames per client
//!
//! Run with: cargo bench --bench registry
//! Results saved to: target/criterion/

use std::future;
use std::time::Duration;

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tokio::runtime::Runtime;
use ws_client_pool::{Dialer, Frame, Registry, RetryLimit, Transport};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const CLIENT_COUNTS: &[usize] = &[10, 100, 1000];
const FRAMES_PER_CLIENT: usize = 64;

// ============================================================================
// In-memory Transport
// ============================================================================

/// Accepts every dial; each session yields `frames` frames, then idles.
struct BenchDialer {
    frames: usize,
}

#[async_trait]
impl Dialer for BenchDialer {
    async fn dial(&self, _url: &str) -> ws_client_pool::Result<Box<dyn Transport>> {
        Ok(Box::new(BenchTransport {
            remaining: self.frames,
        }))
    }
}

struct BenchTransport {
    remaining: usize,
}

#[async_trait]
impl Transport for BenchTransport {
    async fn read_frame(&mut self) -> ws_client_pool::Result<Frame> {
        if self.remaining == 0 {
            return future::pending().await;
        }
        self.remaining -= 1;
        Ok(Frame::text("payload"))
    }

    async fn close(&mut self) -> ws_client_pool::Result<()> {
        Ok(())
    }
}

fn registry(frames: usize, capacity: usize) -> Registry {
    Registry::builder()
        .queue_capacity(capacity)
        .max_retry(RetryLimit::Unlimited)
        .retry_interval(Duration::from_millis(10))
        .dialer(std::sync::Arc::new(BenchDialer { frames }))
        .build()
        .expect("registry")
}

// ============================================================================
// Benchmark: Add/Remove Churn
// ============================================================================

fn bench_churn(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");

    let mut group = c.benchmark_group("churn");

    for &count in CLIENT_COUNTS {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("add_remove", count), &count, |b, &count| {
            b.to_async(&rt).iter(|| async move {
                let registry = registry(0, 4096);
                let ids: Vec<_> = (0..count)
                    .map(|n| {
                        registry
                            .add_client(format!("ws://bench.local/{n}"))
                            .expect("add")
                    })
                    .collect();
                for id in ids {
                    registry.remove_client(id).await.expect("remove");
                }
                registry.shutdown().await;
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Fan-in Throughput
// ============================================================================

fn bench_fan_in(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");

    let mut group = c.benchmark_group("fan_in");
    group.sample_size(20);

    for &count in CLIENT_COUNTS {
        let total = count * FRAMES_PER_CLIENT;
        group.throughput(Throughput::Elements(total as u64));
        group.bench_with_input(BenchmarkId::new("drain", count), &count, |b, &count| {
            b.to_async(&rt).iter(|| async move {
                let registry = registry(FRAMES_PER_CLIENT, 256);
                for n in 0..count {
                    registry
                        .add_client(format!("ws://bench.local/{n}"))
                        .expect("add");
                }

                let events = registry.events();
                let drain = tokio::spawn(async move { while events.recv().await.is_some() {} });

                let messages = registry.messages();
                for _ in 0..count * FRAMES_PER_CLIENT {
                    messages.recv().await.expect("message");
                }

                registry.shutdown().await;
                drain.await.ok();
            });
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(benches, bench_churn, bench_fan_in);
criterion_main!(benches);
