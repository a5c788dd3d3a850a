//! Flag unusual days in a synthetic daily price series.
//!
//! This example demonstrates:
//! - Building a feature matrix of (open price, day-over-day change)
//! - Training a seeded forest and reading the training labels
//! - Reusing the trained forest on a later batch of days
//!
//! Run with: RUST_LOG=isoforest_rs=debug cargo run --example price_anomalies

use isoforest_rs::{ForestConfig, detect, labels, train};
use ndarray::{Array1, Array2, s};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Normal;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Random-walk open prices with a handful of injected spikes.
fn generate_prices(n_days: usize, rng: &mut ChaCha8Rng) -> Array1<f64> {
    let steps = Array1::random_using(n_days, Normal::new(0.0, 0.4).unwrap(), rng);
    let mut prices = Array1::zeros(n_days);
    let mut price = 50.0;
    for (i, step) in steps.iter().enumerate() {
        price = f64::max(price + step, 1.0);
        prices[i] = price;
    }
    for &day in &[300, 777, 1_150, 1_420] {
        if day < n_days {
            prices[day] *= 1.6;
        }
    }
    prices
}

fn to_features(prices: &Array1<f64>) -> Array2<f64> {
    let n = prices.len();
    Array2::from_shape_fn((n, 2), |(i, j)| match j {
        0 => prices[i],
        _ if i == 0 => 0.0,
        _ => prices[i] - prices[i - 1],
    })
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "isoforest_rs=info".into()),
        )
        .init();

    println!("Isolation Forest Price Anomaly Example");
    println!("======================================\n");

    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let prices = generate_prices(1_500, &mut rng);
    let features = to_features(&prices);

    let n_train = 1_200;
    let train_x = features.slice(s![..n_train, ..]).to_owned();
    let test_x = features.slice(s![n_train.., ..]).to_owned();

    println!("Training days: {}", train_x.nrows());
    println!("Test days: {}", test_x.nrows());
    println!();

    let config = ForestConfig::new(100, 512).with_seed(42);
    let (forest, scores) = train(&train_x, &config).expect("Failed to train forest");

    let train_labels = labels(&scores);
    println!("Training anomalies:");
    for (day, (&score, &label)) in scores.iter().zip(train_labels.iter()).enumerate() {
        if label == -1 {
            println!(
                "  day {:>4}: open={:>8.2} change={:>7.2} score={:.3}",
                day,
                train_x[[day, 0]],
                train_x[[day, 1]],
                score
            );
        }
    }
    println!();

    let detection = detect(&forest, &test_x).expect("Failed to score test batch");
    println!(
        "Test batch: {} of {} days flagged",
        detection.anomaly_count(),
        detection.len()
    );
    for i in detection.anomaly_indices() {
        println!(
            "  day {:>4}: open={:>8.2} score={:.3}",
            n_train + i,
            test_x[[i, 0]],
            detection.scores[i]
        );
    }

    println!();
    println!("Split usage per feature: {:?}", forest.feature_split_shares());
}
