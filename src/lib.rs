pub mod config;
pub mod error;
pub mod forest;
pub mod isolation_forest;
pub mod path_length;
pub mod scores;
pub mod tree;

// Re-export commonly used types at crate root
pub use config::ForestConfig;
pub use error::{IsolationForestError, Result};
pub use forest::{Forest, build_forest};
pub use isolation_forest::{Detection, dataset_from_records, detect, train};
pub use path_length::{average_path_length, path_length};
pub use scores::{ANOMALY, NORMAL, label, labels, normalize, raw_anomaly_score, score};
pub use tree::{IsolationTree, Node};
