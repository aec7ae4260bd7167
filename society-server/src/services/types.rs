use society_auth::AuthParams;
use society_axum::RestParams;
use society_core::{ConfigSnapshot, MemoryStore};

pub type SocietyParams = AuthParams<RestParams>;

#[derive(Default)]
pub struct SocietyState {
    pub store: MemoryStore,
}

/// `limit`/`skip` bounds for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default: usize,
    pub max: usize,
}

impl PageLimits {
    pub fn from_config(cfg: &ConfigSnapshot) -> Self {
        let max = cfg.get_usize("paginate.max").unwrap_or(50).max(1);
        let default = cfg.get_usize("paginate.default").unwrap_or(10).clamp(1, max);
        Self { default, max }
    }

    pub fn window<T>(&self, items: Vec<T>, params: &SocietyParams) -> anyhow::Result<Vec<T>> {
        let skip = params.inner.query_usize("skip")?.unwrap_or(0);
        let limit = params.inner.query_usize("limit")?;
        Ok(society_core::feed::paginate(items, skip, limit, self.default, self.max))
    }
}
