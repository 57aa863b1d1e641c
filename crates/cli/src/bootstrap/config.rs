use quickdns_domain::{CliOverrides, Config};

/// Loads and validates the configuration, returning it with the file it
/// came from (`None` when running on defaults).
pub fn load_config(
    path: Option<&str>,
    overrides: CliOverrides,
) -> anyhow::Result<(Config, Option<String>)> {
    let source = Config::resolve_path(path);
    let config = Config::load(path, overrides)?;
    config.validate()?;
    Ok((config, source))
}
