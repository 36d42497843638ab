// Crate identity baked in at build time

/// Served verbatim on GET /version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const NAME: &str = env!("CARGO_PKG_NAME");

/// User-Agent sent to media hosts and analysis services.
pub fn user_agent() -> String {
    format!("{}/{}", NAME, VERSION)
}
