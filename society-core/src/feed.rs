//! Social feed bookkeeping. `likes_count` and `comments_count` always equal
//! the lengths of `likes` and `comments`.

use chrono::Utc;

use crate::models::{PostStatus, SocialPost};

impl SocialPost {
    /// Add or remove `user_id` from the likes. Returns whether the user now
    /// likes the post.
    pub fn toggle_like(&mut self, user_id: &str) -> bool {
        let liked = if let Some(pos) = self.likes.iter().position(|u| u == user_id) {
            self.likes.remove(pos);
            false
        } else {
            self.likes.push(user_id.to_string());
            true
        };
        self.sync_counters();
        self.updated_at = Utc::now();
        liked
    }

    pub fn attach_comment(&mut self, comment_id: &str) {
        if !self.comments.iter().any(|c| c == comment_id) {
            self.comments.push(comment_id.to_string());
        }
        self.sync_counters();
        self.updated_at = Utc::now();
    }

    /// Returns `false` if the comment was not attached.
    pub fn detach_comment(&mut self, comment_id: &str) -> bool {
        let before = self.comments.len();
        self.comments.retain(|c| c != comment_id);
        self.sync_counters();
        let removed = self.comments.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    pub fn deactivate(&mut self) {
        self.status = PostStatus::Deactivated;
        self.updated_at = Utc::now();
    }

    pub fn sync_counters(&mut self) {
        self.likes_count = self.likes.len() as u32;
        self.comments_count = self.comments.len() as u32;
    }

    /// Active and not written by someone the viewer blocked.
    pub fn visible_to(&self, blocked: &[String]) -> bool {
        self.is_active() && !blocked.iter().any(|b| *b == self.author)
    }
}

/// `skip`/`limit` window. `limit` is clamped to `max`; `None` means `default`.
pub fn paginate<T>(items: Vec<T>, skip: usize, limit: Option<usize>, default: usize, max: usize) -> Vec<T> {
    let limit = limit.unwrap_or(default).min(max);
    items.into_iter().skip(skip).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorModel;

    fn post() -> SocialPost {
        let now = Utc::now();
        SocialPost {
            id: "post:1".into(),
            society_id: "soc".into(),
            author: "r1".into(),
            author_model: AuthorModel::Resident,
            content: "Diwali potluck on Sunday".into(),
            images: vec![],
            likes: vec![],
            likes_count: 0,
            comments: vec![],
            comments_count: 0,
            status: PostStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn like_toggles_and_counter_follows() {
        let mut p = post();
        assert!(p.toggle_like("r2"));
        assert!(p.toggle_like("r3"));
        assert_eq!(p.likes_count, 2);
        assert!(!p.toggle_like("r2"));
        assert_eq!(p.likes, vec!["r3".to_string()]);
        assert_eq!(p.likes_count, 1);
    }

    #[test]
    fn comments_counter_follows_attach_and_detach() {
        let mut p = post();
        p.attach_comment("c1");
        p.attach_comment("c1");
        p.attach_comment("c2");
        assert_eq!(p.comments_count, 2);
        assert!(p.detach_comment("c1"));
        assert!(!p.detach_comment("c1"));
        assert_eq!(p.comments_count, 1);
    }

    #[test]
    fn blocked_authors_and_deactivated_posts_are_hidden() {
        let mut p = post();
        assert!(p.visible_to(&[]));
        assert!(!p.visible_to(&["r1".to_string()]));
        p.deactivate();
        assert!(!p.visible_to(&[]));
    }

    #[test]
    fn paginate_clamps_limit() {
        let items: Vec<u32> = (0..30).collect();
        assert_eq!(paginate(items.clone(), 0, None, 10, 20).len(), 10);
        assert_eq!(paginate(items.clone(), 25, Some(50), 10, 20), vec![25, 26, 27, 28, 29]);
        assert_eq!(paginate(items, 5, Some(2), 10, 20), vec![5, 6]);
    }
}
