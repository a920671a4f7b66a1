use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::CommentStore,
    error::{AppError, AppResult},
    models::{Comment, NewComment, User},
};

/// Comment creation, listing and moderation
#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentStore>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentStore>) -> Self {
        Self { comments }
    }

    pub async fn add(&self, author: &User, request: NewComment) -> AppResult<Comment> {
        if request.text.trim().is_empty() || request.content_id.is_empty() {
            return Err(AppError::InvalidInput("Invalid comment data".to_string()));
        }

        let comment = Comment::new(author, request);
        self.comments.insert(&comment).await?;

        tracing::info!(
            comment_id = %comment.id,
            content_id = %comment.content_id,
            user_id = %author.id,
            "Comment added"
        );
        Ok(comment)
    }

    /// Every comment for the content, newest first
    pub async fn list(&self, content_id: &str) -> AppResult<Vec<Comment>> {
        self.comments.find_by_content(content_id).await
    }

    pub async fn delete(&self, requester: &User, comment_id: &str) -> AppResult<()> {
        let not_found = || AppError::NotFound("Comment not found".to_string());

        let id = Uuid::parse_str(comment_id).map_err(|_| not_found())?;
        let comment = self.comments.find_by_id(id).await?.ok_or_else(not_found)?;

        if !comment.can_be_deleted_by(requester) {
            tracing::warn!(
                comment_id = %id,
                requester = %requester.id,
                "Rejected comment deletion"
            );
            return Err(AppError::Unauthorized(
                "Not authorized to delete this comment".to_string(),
            ));
        }

        self.comments.delete(id).await?;
        tracing::info!(comment_id = %id, requester = %requester.id, "Comment removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockCommentStore;
    use crate::models::ContentType;

    fn user(is_admin: bool) -> User {
        let mut user = User::new("U".to_string(), "u@example.com".to_string(), "h".to_string());
        user.is_admin = is_admin;
        user
    }

    fn request(text: &str) -> NewComment {
        NewComment {
            content_id: "1399".to_string(),
            content_type: ContentType::Tv,
            text: text.to_string(),
            rating: 5.0,
        }
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        let mut store = MockCommentStore::new();
        store.expect_insert().never();

        let service = CommentService::new(Arc::new(store));
        let err = service.add(&user(false), request("   ")).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(msg) if msg == "Invalid comment data"));
    }

    #[tokio::test]
    async fn test_stranger_cannot_delete() {
        let owner = user(false);
        let comment = Comment::new(&owner, request("Winter is coming"));
        let comment_id = comment.id;

        let mut store = MockCommentStore::new();
        store
            .expect_find_by_id()
            .returning(move |_| Ok(Some(comment.clone())));
        store.expect_delete().never();

        let service = CommentService::new(Arc::new(store));
        let err = service
            .delete(&user(false), &comment_id.to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_admin_can_delete() {
        let comment = Comment::new(&user(false), request("Winter is coming"));
        let comment_id = comment.id;

        let mut store = MockCommentStore::new();
        store
            .expect_find_by_id()
            .returning(move |_| Ok(Some(comment.clone())));
        store
            .expect_delete()
            .withf(move |id| *id == comment_id)
            .times(1)
            .returning(|_| Ok(()));

        let service = CommentService::new(Arc::new(store));
        service
            .delete(&user(true), &comment_id.to_string())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let mut store = MockCommentStore::new();
        store.expect_find_by_id().never();

        let service = CommentService::new(Arc::new(store));
        let err = service.delete(&user(true), "not-a-uuid").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }
}
