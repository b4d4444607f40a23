use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Crates whose records are shown at the chosen level. Everything else logs at `warn`.
const IDX_TARGETS: [&str; 4] = ["idx_cli", "idx_error", "idx_format", "idx_io"];

/// Install a stderr subscriber. Records from the `log` facade used by the library crates are
/// forwarded to it.
pub fn setup_logger(filter: EnvFilter, is_verbose: bool) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(is_verbose)
        .with_env_filter(filter)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

/// `RUST_LOG` if set, otherwise the IDX crates at `info` (`trace` when verbose).
pub fn default_env_filter(is_verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::builder().parse_lossy(default_directives(is_verbose)))
}

fn default_directives(is_verbose: bool) -> String {
    let level = if is_verbose { "trace" } else { "info" };
    std::iter::once("warn".to_string())
        .chain(IDX_TARGETS.iter().map(|target| format!("{target}={level}")))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tracing_subscriber::EnvFilter;

    use super::default_directives;

    #[rstest]
    #[case(false, "warn,idx_cli=info,idx_error=info,idx_format=info,idx_io=info")]
    #[case(true, "warn,idx_cli=trace,idx_error=trace,idx_format=trace,idx_io=trace")]
    fn directives_scope_idx_crates(#[case] is_verbose: bool, #[case] expected: &str) {
        let directives = default_directives(is_verbose);
        assert_eq!(directives, expected);
        assert!(EnvFilter::builder().parse(&directives).is_ok());
    }
}
