use cropline_core::CropOption;

/// Parse a crop option written the way it appears in crop paths,
/// e.g. `crop`, `quality(80)` or `pad(255,255,255)`.
pub fn parse_option(raw: &str) -> Result<CropOption, String> {
    let raw = raw.trim();
    let (name, args) = match raw.split_once('(') {
        Some((name, rest)) => {
            let args = rest
                .strip_suffix(')')
                .ok_or_else(|| format!("unbalanced parentheses in {}", raw))?;
            (name, Some(args))
        }
        None => (raw, None),
    };

    CropOption::parse(name, args)?.ok_or_else(|| format!("unknown crop option: {}", name))
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
