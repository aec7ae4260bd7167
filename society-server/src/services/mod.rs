pub mod types;
pub use types::{PageLimits, SocietyParams, SocietyState};

use std::sync::Arc;

use society_axum::AxumApp;
use society_core::SocietyApp;

pub mod access;
pub mod bills;
pub mod blocks;
pub mod comments;
pub mod posts;
pub mod residents;
pub mod scheduled_bills;
pub mod societies;
pub mod visitors;

pub struct SocietyServices {
    pub societies: Arc<societies::SocietiesService>,
    pub residents: Arc<residents::ResidentsService>,
    pub posts: Arc<posts::PostsService>,
    pub comments: Arc<comments::CommentsService>,
    pub blocks: Arc<blocks::BlocksService>,
    pub bills: Arc<bills::BillsService>,
    pub scheduled_bills: Arc<scheduled_bills::ScheduledBillsService>,
    pub visitors: Arc<visitors::VisitorsService>,
}

pub fn configure(app: &SocietyApp<SocietyParams>, state: Arc<SocietyState>) -> SocietyServices {
    let cfg = app.config_snapshot();
    let limits = PageLimits::from_config(&cfg);
    let due_in_days = cfg
        .get_u64("billing.default_due_in_days")
        .and_then(|d| u32::try_from(d).ok())
        .unwrap_or(15);

    societies::societies_shared::register_hooks(app);
    residents::residents_shared::register_hooks(app);
    posts::posts_shared::register_hooks(app);
    comments::comments_shared::register_hooks(app);
    blocks::blocks_shared::register_hooks(app);
    bills::bills_shared::register_hooks(app);
    scheduled_bills::scheduled_bills_shared::register_hooks(app);
    visitors::visitors_shared::register_hooks(app);

    SocietyServices {
        societies: Arc::new(societies::SocietiesService::new(Arc::clone(&state))),
        residents: Arc::new(residents::ResidentsService::new(Arc::clone(&state))),
        posts: Arc::new(posts::PostsService::new(Arc::clone(&state), limits)),
        comments: Arc::new(comments::CommentsService::new(Arc::clone(&state), limits)),
        blocks: Arc::new(blocks::BlocksService::new(Arc::clone(&state))),
        bills: Arc::new(bills::BillsService::new(Arc::clone(&state), due_in_days)),
        scheduled_bills: Arc::new(scheduled_bills::ScheduledBillsService::new(
            Arc::clone(&state),
            due_in_days,
        )),
        visitors: Arc::new(visitors::VisitorsService::new(state)),
    }
}

impl SocietyServices {
    /// Standard routes first, then each service's custom routes.
    pub fn mount(&self, ax: AxumApp<SocietyParams>) -> AxumApp<SocietyParams> {
        let app = ax.app.clone();
        ax.use_service("/societies", Arc::clone(&self.societies))
            .use_service("/residents", Arc::clone(&self.residents))
            .use_service("/posts", Arc::clone(&self.posts))
            .use_service("/comments", Arc::clone(&self.comments))
            .use_service("/blocks", Arc::clone(&self.blocks))
            .use_service("/bills", Arc::clone(&self.bills))
            .use_service("/scheduled-bills", Arc::clone(&self.scheduled_bills))
            .use_service("/visitors", Arc::clone(&self.visitors))
            .use_router(societies::societies_shared::routes(&app, Arc::clone(&self.societies)))
            .use_router(residents::residents_shared::routes(&app, Arc::clone(&self.residents)))
            .use_router(posts::posts_shared::routes(&app, Arc::clone(&self.posts)))
            .use_router(bills::bills_shared::routes(&app, Arc::clone(&self.bills)))
            .use_router(scheduled_bills::scheduled_bills_shared::routes(
                &app,
                Arc::clone(&self.scheduled_bills),
            ))
            .use_router(visitors::visitors_shared::routes(&app, Arc::clone(&self.visitors)))
    }
}
