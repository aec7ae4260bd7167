use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use society_core::models::{new_id, PostStatus, SocialPost};
use society_core::{bail_society, schema, ServiceCapabilities, SocietyService, TenantContext};
use tracing::info;

use crate::services::access::{caller_resident, feed_author, forbidden, staged_caller};
use crate::services::{PageLimits, SocietyParams, SocietyState};

use super::posts_schema::{CreatePost, PatchPost, SCHEMA_ERROR};
use super::posts_shared;

pub(crate) const POST: &str = "Post";

pub struct PostsService {
    pub state: Arc<SocietyState>,
    pub limits: PageLimits,
}

fn require_active(post: &SocialPost) -> Result<()> {
    if !post.is_active() {
        bail_society!(gone, "Post {} has been removed", post.id);
    }
    Ok(())
}

impl PostsService {
    pub fn new(state: Arc<SocietyState>, limits: PageLimits) -> Self {
        Self { state, limits }
    }

    /// Toggle the caller's like.
    pub async fn like(&self, ctx: &TenantContext, id: &str) -> Result<SocialPost> {
        let society = ctx.society();
        self.state
            .store
            .transaction(|tx| {
                let (user, _) = feed_author(ctx, staged_caller(tx, ctx))?;
                let mut post = tx.posts.require(society, id, POST)?;
                require_active(&post)?;
                post.toggle_like(&user);
                tx.posts.put(post.clone());
                Ok(post)
            })
            .await
    }
}

#[async_trait]
impl SocietyService<SocietyParams> for PostsService {
    type Record = SocialPost;
    type Create = CreatePost;
    type Patch = PatchPost;

    fn capabilities(&self) -> ServiceCapabilities {
        posts_shared::crud_capabilities()
    }

    /// Active posts, newest first, minus authors the caller has blocked.
    async fn find(&self, ctx: &TenantContext, params: SocietyParams) -> Result<Vec<SocialPost>> {
        let society = ctx.society();
        let mut posts = self
            .state
            .store
            .read(|c| -> Result<Vec<SocialPost>> {
                let me = caller_resident(c, ctx);
                feed_author(ctx, me)?;
                let blocked: &[String] = me.map(|r| r.blocked_users.as_slice()).unwrap_or_default();
                Ok(c.posts
                    .in_society(society)
                    .filter(|p| p.visible_to(blocked))
                    .cloned()
                    .collect())
            })
            .await?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        self.limits.window(posts, &params)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: SocietyParams) -> Result<SocialPost> {
        let post = self
            .state
            .store
            .read(|c| -> Result<SocialPost> {
                feed_author(ctx, caller_resident(c, ctx))?;
                c.posts.require(ctx.society(), id, POST)
            })
            .await?;
        if !ctx.is_admin() {
            require_active(&post)?;
        }
        Ok(post)
    }

    async fn create(&self, ctx: &TenantContext, data: CreatePost, _params: SocietyParams) -> Result<SocialPost> {
        schema::validate(&data, SCHEMA_ERROR)?;
        let society = ctx.society();
        let post = self
            .state
            .store
            .transaction(|tx| {
                let (author, author_model) = feed_author(ctx, staged_caller(tx, ctx))?;
                let now = Utc::now();
                let post = SocialPost {
                    id: new_id("post"),
                    society_id: society.to_string(),
                    author,
                    author_model,
                    content: data.content.trim().to_string(),
                    images: data.images,
                    likes: Vec::new(),
                    likes_count: 0,
                    comments: Vec::new(),
                    comments_count: 0,
                    status: PostStatus::Active,
                    created_at: now,
                    updated_at: now,
                };
                tx.posts.put(post.clone());
                Ok(post)
            })
            .await?;
        info!(society = %society, post = %post.id, author = %post.author, "post published");
        Ok(post)
    }

    /// Authors edit their own active posts.
    async fn patch(&self, ctx: &TenantContext, id: &str, data: PatchPost, _params: SocietyParams) -> Result<SocialPost> {
        schema::validate(&data, SCHEMA_ERROR)?;
        let society = ctx.society();
        self.state
            .store
            .transaction(|tx| {
                let (me, _) = feed_author(ctx, staged_caller(tx, ctx))?;
                let mut post = tx.posts.require(society, id, POST)?;
                if post.author != me {
                    return Err(forbidden("Only the author may edit a post"));
                }
                require_active(&post)?;
                if let Some(content) = data.content {
                    post.content = content.trim().to_string();
                }
                if let Some(images) = data.images {
                    post.images = images;
                }
                post.updated_at = Utc::now();
                tx.posts.put(post.clone());
                Ok(post)
            })
            .await
    }

    /// Soft delete by the author or the society.
    async fn remove(&self, ctx: &TenantContext, id: &str, _params: SocietyParams) -> Result<SocialPost> {
        let society = ctx.society();
        self.state
            .store
            .transaction(|tx| {
                let (me, _) = feed_author(ctx, staged_caller(tx, ctx))?;
                let mut post = tx.posts.require(society, id, POST)?;
                if post.author != me && !ctx.is_admin() {
                    return Err(forbidden("Only the author or the society may remove a post"));
                }
                require_active(&post)?;
                post.deactivate();
                tx.posts.put(post.clone());
                Ok(post)
            })
            .await
    }
}
