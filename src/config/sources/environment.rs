//! Environment source: NORMCACHE__SECTION__KEY=value

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const ENV_PREFIX: &str = "NORMCACHE";
pub const ENV_SEPARATOR: &str = "__";

/// Add environment overrides, e.g. `NORMCACHE__CACHE__WRITE_TO_CACHE_ASYNCHRONOUSLY=true`.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    )
}
