//! Configuration for the template compiler
//!
//! Hard limits are generated at build time from `config/<profile>.toml`
//! (see `build.rs`); user-facing preferences and the delimiter syntax live in
//! [`runtime`].

include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod runtime;

pub use runtime::{ConfigError, LexicalPreferences, LoggingPreferences, RuntimeConfig, SyntaxConfig};

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the configuration profile used during build
    pub fn profile() -> &'static str {
        option_env!("JINJA_BUILD_PROFILE").unwrap_or("development")
    }

    /// Returns the configuration directory used during build
    pub fn config_dir() -> &'static str {
        option_env!("JINJA_CONFIG_DIR").unwrap_or("config")
    }

    pub fn source_info() -> String {
        format!("Generated from {}/{}.toml", config_dir(), profile())
    }
}

#[cfg(test)]
mod tests {
    use super::compile_time;

    #[test]
    fn test_generated_limits_are_sane() {
        assert!(compile_time::syntax::MAX_PARSE_DEPTH > 0);
        assert!(compile_time::syntax::MAX_ERROR_HISTORY > 0);
        assert!(compile_time::logging::LOG_BUFFER_SIZE >= 100);
        assert!(super::build_info::source_info().ends_with(".toml"));
    }
}
