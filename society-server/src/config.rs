use society_core::config::ENV_PREFIX;
use society_core::SocietyConfig;
use tracing::debug;

/// Defaults, then `SOCIETY__*` environment overrides.
pub fn load() -> SocietyConfig {
    let mut cfg = defaults();
    let applied = cfg.merge_env(ENV_PREFIX, std::env::vars());
    if !applied.is_empty() {
        debug!(keys = ?applied, "configuration overridden from environment");
    }
    cfg
}

pub fn defaults() -> SocietyConfig {
    let mut cfg = SocietyConfig::new();

    // HTTP
    cfg.set("http.host", "127.0.0.1");
    cfg.set("http.port", "3036");

    // Auth
    cfg.set("auth.jwt.issuer", "society-api");

    // Feed
    cfg.set("paginate.default", "10");
    cfg.set("paginate.max", "50");

    // Billing
    cfg.set("billing.scheduler_interval_secs", "3600");
    cfg.set("billing.default_due_in_days", "15");

    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_defaults() {
        let mut cfg = defaults();
        cfg.merge_env(
            ENV_PREFIX,
            vec![("SOCIETY__PAGINATE__MAX".to_string(), "100".to_string())],
        );
        let snap = cfg.snapshot();
        assert_eq!(snap.get_usize("paginate.max"), Some(100));
        assert_eq!(snap.get_usize("paginate.default"), Some(10));
        assert_eq!(snap.get_u64("billing.scheduler_interval_secs"), Some(3600));
    }
}
