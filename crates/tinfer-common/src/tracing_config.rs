//! Tracing setup for debugging inference.
//!
//! `TINFER_LOG` (or `RUST_LOG`) sets the filter. `TINFER_LOG_FORMAT=tree`
//! switches from flat lines to a `tracing-tree` layer that nests each solver
//! round under the session that ran it.
//!
//! ```bash
//! TINFER_LOG=tinfer_solver=debug TINFER_LOG_FORMAT=tree cargo test -p tinfer-solver
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

fn wants_tree(format: &str) -> bool {
    format.eq_ignore_ascii_case("tree")
}

/// Install a stderr subscriber if a filter variable is set.
///
/// A subscriber that is already installed is left alone.
pub fn init_tracing() {
    let filter = match std::env::var("TINFER_LOG") {
        Ok(val) => EnvFilter::builder().parse_lossy(val),
        Err(_) if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        Err(_) => return,
    };
    let format = std::env::var("TINFER_LOG_FORMAT").unwrap_or_default();
    let registry = Registry::default().with(filter);
    let _ = if wants_tree(&format) {
        let tree = tracing_tree::HierarchicalLayer::default()
            .with_indent_amount(2)
            .with_indent_lines(true)
            .with_deferred_spans(true)
            .with_targets(true);
        registry.with(tree).try_init()
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_format_is_case_insensitive() {
        assert!(wants_tree("TREE"));
        assert!(wants_tree("tree"));
        assert!(!wants_tree(""));
        assert!(!wants_tree("json"));
    }
}
