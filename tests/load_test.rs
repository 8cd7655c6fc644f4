//! Load testing for the balancer.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reverse_balancer::Strategy;

mod common;

use common::{TestProxy, client, http_url, test_config};

async fn run_load(proxy: &TestProxy, concurrency: usize, requests_per_task: usize) -> Vec<(Duration, String)> {
    let client = client();
    let mut tasks = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let url = format!("{}/books", proxy.proxy_url);
        tasks.push(tokio::spawn(async move {
            let mut results = Vec::new();
            for _ in 0..requests_per_task {
                let req_start = Instant::now();
                if let Ok(res) = client.get(&url).send().await {
                    if res.status().is_success() {
                        if let Ok(body) = res.text().await {
                            results.push((req_start.elapsed(), body));
                        }
                    }
                }
            }
            results
        }));
    }

    let mut all = Vec::new();
    for task in tasks {
        all.extend(task.await.unwrap());
    }
    all
}

#[tokio::test]
async fn test_load_round_robin() {
    let backends = [
        common::start_mock_backend("b1").await,
        common::start_mock_backend("b2").await,
        common::start_mock_backend("b3").await,
    ];
    let urls: Vec<String> = backends.iter().map(|a| http_url(*a)).collect();
    let proxy = TestProxy::start(test_config(&urls)).await;

    let concurrency = 20;
    let requests_per_task = 25;
    let total_requests = concurrency * requests_per_task;

    let start = Instant::now();
    let mut results = run_load(&proxy, concurrency, requests_per_task).await;
    let duration = start.elapsed();

    assert_eq!(results.len(), total_requests, "every request should succeed");

    let mut per_backend: HashMap<String, usize> = HashMap::new();
    for (_, body) in &results {
        *per_backend.entry(body.clone()).or_default() += 1;
    }
    // Every pick advances the shared cursor, so the split stays even.
    for name in ["b1", "b2", "b3"] {
        let hits = per_backend.get(name).copied().unwrap_or(0);
        assert!(hits >= total_requests / 3, "{} got {} of {}", name, hits, total_requests);
    }

    assert!(
        common::eventually(Duration::from_secs(2), || {
            proxy.pool.snapshot().iter().all(|s| s.current_connections == 0)
        })
        .await,
        "connection counts must return to zero"
    );

    results.sort_by_key(|(latency, _)| *latency);
    let p50 = results[results.len() / 2].0;
    let p99 = results[(results.len() as f64 * 0.99) as usize].0;

    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Concurrency:    {}", concurrency);
    println!("Total Duration: {:?}", duration);
    println!("Requests/sec:   {:.2}", total_requests as f64 / duration.as_secs_f64());
    println!("P50 Latency:    {:?}", p50);
    println!("P99 Latency:    {:?}", p99);
    println!("Distribution:   {:?}", per_backend);
    println!("-------------------------\n");
}

#[tokio::test]
async fn test_load_least_connections() {
    let a = common::start_mock_backend("a").await;
    let b = common::start_mock_backend("b").await;
    let mut config = test_config(&[http_url(a), http_url(b)]);
    config.strategy = Strategy::LeastConnections;
    let proxy = TestProxy::start(config).await;

    let results = run_load(&proxy, 16, 20).await;
    assert_eq!(results.len(), 16 * 20);
    assert!(results.iter().any(|(_, body)| body == "b"), "ties must not pin every request to one backend");

    assert!(
        common::eventually(Duration::from_secs(2), || {
            proxy.pool.snapshot().iter().all(|s| s.current_connections == 0)
        })
        .await
    );
}
