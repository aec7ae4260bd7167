use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use society_core::models::{new_id, PostStatus, SocialComment};
use society_core::{bail_society, schema, ServiceCapabilities, SocietyError, SocietyService, TenantContext};

use crate::services::access::{caller_resident, feed_author, forbidden, staged_caller};
use crate::services::posts::posts_service::POST;
use crate::services::{PageLimits, SocietyParams, SocietyState};

use super::comments_schema::{CreateComment, SCHEMA_ERROR};
use super::comments_shared;

const COMMENT: &str = "Comment";

pub struct CommentsService {
    pub state: Arc<SocietyState>,
    pub limits: PageLimits,
}

impl CommentsService {
    pub fn new(state: Arc<SocietyState>, limits: PageLimits) -> Self {
        Self { state, limits }
    }
}

#[async_trait]
impl SocietyService<SocietyParams> for CommentsService {
    type Record = SocialComment;
    type Create = CreateComment;
    type Patch = Value;

    fn capabilities(&self) -> ServiceCapabilities {
        comments_shared::crud_capabilities()
    }

    /// `?postId=` is required; active comments, oldest first.
    async fn find(&self, ctx: &TenantContext, params: SocietyParams) -> Result<Vec<SocialComment>> {
        let Some(post_id) = params.inner.query_str("postId").map(str::to_string) else {
            return Err(SocietyError::bad_request("Query parameter 'postId' is required").into_anyhow());
        };
        let society = ctx.society();
        let mut comments = self
            .state
            .store
            .read(|c| -> Result<Vec<SocialComment>> {
                feed_author(ctx, caller_resident(c, ctx))?;
                c.posts.require(society, &post_id, POST)?;
                Ok(c.comments
                    .in_society(society)
                    .filter(|cm| cm.post_id == post_id && cm.status == PostStatus::Active)
                    .cloned()
                    .collect())
            })
            .await?;
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        self.limits.window(comments, &params)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: SocietyParams) -> Result<SocialComment> {
        let comment = self
            .state
            .store
            .read(|c| -> Result<SocialComment> {
                feed_author(ctx, caller_resident(c, ctx))?;
                c.comments.require(ctx.society(), id, COMMENT)
            })
            .await?;
        if comment.status != PostStatus::Active && !ctx.is_admin() {
            bail_society!(gone, "Comment {} has been removed", id);
        }
        Ok(comment)
    }

    async fn create(&self, ctx: &TenantContext, data: CreateComment, _params: SocietyParams) -> Result<SocialComment> {
        schema::validate(&data, SCHEMA_ERROR)?;
        let society = ctx.society();
        self.state
            .store
            .transaction(|tx| {
                let (author, author_model) = feed_author(ctx, staged_caller(tx, ctx))?;
                let mut post = tx.posts.require(society, data.post_id.trim(), POST)?;
                if !post.is_active() {
                    bail_society!(gone, "Post {} has been removed", post.id);
                }

                let comment = SocialComment {
                    id: new_id("comment"),
                    society_id: society.to_string(),
                    post_id: post.id.clone(),
                    author,
                    author_model,
                    content: data.content.trim().to_string(),
                    status: PostStatus::Active,
                    created_at: Utc::now(),
                };
                post.attach_comment(&comment.id);
                tx.posts.put(post);
                tx.comments.put(comment.clone());
                Ok(comment)
            })
            .await
    }

    /// Soft delete by the author or the society; the post's counter follows.
    async fn remove(&self, ctx: &TenantContext, id: &str, _params: SocietyParams) -> Result<SocialComment> {
        let society = ctx.society();
        self.state
            .store
            .transaction(|tx| {
                let (me, _) = feed_author(ctx, staged_caller(tx, ctx))?;
                let mut comment = tx.comments.require(society, id, COMMENT)?;
                if comment.author != me && !ctx.is_admin() {
                    return Err(forbidden("Only the author or the society may remove a comment"));
                }
                if comment.status != PostStatus::Active {
                    bail_society!(gone, "Comment {} has been removed", id);
                }

                comment.status = PostStatus::Deactivated;
                if let Some(mut post) = tx.posts.get(&comment.post_id).cloned() {
                    post.detach_comment(&comment.id);
                    tx.posts.put(post);
                }
                tx.comments.put(comment.clone());
                Ok(comment)
            })
            .await
    }
}
