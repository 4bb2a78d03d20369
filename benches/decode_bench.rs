//! Decoder benchmarks
//!
//! SEMP v1 XML and SEMP v2 JSON decoding plus exposition formatting.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use solace_exporter::semp::{v1, v2, Category};
use solace_exporter::transformer::PrometheusFormatter;

fn bridge_reply(bridges: usize) -> String {
    let body: String = (0..bridges)
        .map(|i| {
            format!(
                r#"<bridge><bridge-name>br{i}</bridge-name><local-vpn-name>default</local-vpn-name>
<client><num-subscriptions>{i}</num-subscriptions><slow-subscriber>false</slow-subscriber>
<stats><total-client-messages-received>{i}00</total-client-messages-received>
<total-client-messages-sent>{i}50</total-client-messages-sent>
<ingress-discards><total-ingress-discards>1</total-ingress-discards></ingress-discards>
</stats></client></bridge>"#
            )
        })
        .collect();
    format!(
        r#"<rpc-reply><rpc><show><bridge><bridges>{}</bridges></bridge></show></rpc><execute-result code="ok"/></rpc-reply>"#,
        body
    )
}

fn queue_page(queues: usize) -> String {
    let data: Vec<serde_json::Value> = (0..queues)
        .map(|i| {
            serde_json::json!({
                "msgVpnName": "default",
                "queueName": format!("q{}", i),
                "rxMsgRate": i,
                "bindCount": 1,
                "spooledMsgCount": i * 10,
            })
        })
        .collect();
    serde_json::json!({"data": data, "meta": {"responseCode": 200}}).to_string()
}

fn benchmark_v1_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("v1_decode");

    for count in [1usize, 50, 500] {
        let body = bridge_reply(count);
        group.bench_with_input(BenchmarkId::new("bridge_stats", count), &body, |b, body| {
            b.iter(|| v1::decode(Category::BridgeStats, body))
        });
    }

    group.finish();
}

fn benchmark_v2_decode(c: &mut Criterion) {
    let query = v2::Query::build(Category::QueueStatsV2, "http://localhost:8080", "default", "*", &[])
        .expect("queue query");
    let mut group = c.benchmark_group("v2_decode");

    for count in [1usize, 100] {
        let body = queue_page(count);
        group.bench_with_input(BenchmarkId::new("queue_stats", count), &body, |b, body| {
            b.iter(|| query.decode(body))
        });
    }

    group.finish();
}

fn benchmark_format(c: &mut Criterion) {
    let tuples = v1::decode(Category::BridgeStats, &bridge_reply(500)).expect("bridge reply");
    let formatter = PrometheusFormatter;

    c.bench_function("format_bridge_stats_500", |b| {
        b.iter(|| formatter.format(&tuples))
    });
}

criterion_group!(
    benches,
    benchmark_v1_decode,
    benchmark_v2_decode,
    benchmark_format
);
criterion_main!(benches);
