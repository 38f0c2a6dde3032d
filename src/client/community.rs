//! Comments, newsletter and bookmarks

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::{ApiClient, ClientResult};
use crate::models::{Article, Bookmark, Comment, EntityId, Page};

#[derive(Serialize)]
struct NewComment<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<&'a EntityId>,
}

fn comments_path(slug: &str) -> String {
    format!("articles/{}/comments/", urlencoding::encode(slug))
}

impl ApiClient {
    /// `GET articles/{slug}/comments/`
    pub async fn comments(&self, slug: &str) -> ClientResult<Vec<Comment>> {
        let page: Page<Comment> = self.get_cached(&comments_path(slug), self.ttls.comments).await?;
        Ok(page.into_items())
    }

    /// `POST articles/{slug}/comments/`
    pub async fn create_comment(&self, token: &str, slug: &str, content: &str) -> ClientResult<Comment> {
        let path = comments_path(slug);
        let body = NewComment { content: content.trim(), parent: None };
        let comment = self.send_json(Method::POST, &path, Some(token), &body).await?;
        self.invalidate(&path).await;
        Ok(comment)
    }

    /// `POST articles/{slug}/comments/{parent}/replies/`
    pub async fn reply_to_comment(
        &self,
        token: &str,
        slug: &str,
        parent: &EntityId,
        content: &str,
    ) -> ClientResult<Comment> {
        let path = format!("{}{}/replies/", comments_path(slug), urlencoding::encode(parent.as_str()));
        let body = NewComment { content: content.trim(), parent: Some(parent) };
        let reply = self.send_json(Method::POST, &path, Some(token), &body).await?;
        self.invalidate(&comments_path(slug)).await;
        Ok(reply)
    }

    /// `DELETE articles/{slug}/comments/{id}/`
    pub async fn delete_comment(&self, token: &str, slug: &str, id: &EntityId) -> ClientResult<()> {
        let path = format!("{}{}/", comments_path(slug), urlencoding::encode(id.as_str()));
        self.send(self.request(Method::DELETE, &path, Some(token))).await?;
        self.invalidate(&comments_path(slug)).await;
        Ok(())
    }

    /// `POST newsletter/`
    pub async fn subscribe_newsletter(&self, email: &str) -> ClientResult<()> {
        let body = serde_json::json!({ "email": email.trim() });
        self.send_json_unit(Method::POST, "newsletter/", None, &body).await
    }

    /// `GET bookmarks/`
    pub async fn bookmarks(&self, token: &str) -> ClientResult<Vec<Article>> {
        let page: Page<Bookmark> = self.get_json("bookmarks/", Some(token)).await?;
        Ok(page.into_items().into_iter().map(Bookmark::into_article).collect())
    }

    /// `POST bookmarks/`
    pub async fn add_bookmark(&self, token: &str, article: &EntityId) -> ClientResult<()> {
        let body = serde_json::json!({ "article": article });
        let _: Value = self.send_json(Method::POST, "bookmarks/", Some(token), &body).await?;
        Ok(())
    }

    /// `DELETE bookmarks/{article}/`
    pub async fn remove_bookmark(&self, token: &str, article: &EntityId) -> ClientResult<()> {
        let path = format!("bookmarks/{}/", urlencoding::encode(article.as_str()));
        self.send(self.request(Method::DELETE, &path, Some(token))).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::EntityId;
    use crate::test_support::{FakeApi, GOOD_TOKEN};

    #[tokio::test]
    async fn test_list_comments() {
        let api = FakeApi::start().await;
        let comments = api.client().comments("rust-async").await.unwrap();

        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].replies.len(), 1);
    }

    #[tokio::test]
    async fn test_create_comment_invalidates_cached_list() {
        let api = FakeApi::start().await;
        let client = api.client();

        assert_eq!(client.comments("rust-async").await.unwrap().len(), 1);
        let created = client.create_comment(GOOD_TOKEN, "rust-async", "  Great read  ").await.unwrap();
        assert_eq!(created.content, "Great read");

        let after = client.comments("rust-async").await.unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(api.hits("GET /api/articles/rust-async/comments/"), 2);
    }

    #[tokio::test]
    async fn test_create_comment_requires_token() {
        let api = FakeApi::start().await;
        let err = api.client().create_comment("bad", "rust-async", "hi").await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Authentication credentials were not provided.");
    }

    #[tokio::test]
    async fn test_reply_carries_parent() {
        let api = FakeApi::start().await;
        let reply = api
            .client()
            .reply_to_comment(GOOD_TOKEN, "rust-async", &EntityId::from(10), "Agreed")
            .await
            .unwrap();

        assert_eq!(reply.parent, Some(EntityId::from(10)));
        let body = api.last_body().unwrap();
        assert_eq!(body["parent"], "10");
        assert_eq!(body["content"], "Agreed");
    }

    #[tokio::test]
    async fn test_delete_comment() {
        let api = FakeApi::start().await;
        let client = api.client();
        client
            .delete_comment(GOOD_TOKEN, "rust-async", &EntityId::from(11))
            .await
            .unwrap();
        assert_eq!(api.hits("DELETE /api/articles/rust-async/comments/11/"), 1);

        let refused = client
            .delete_comment(GOOD_TOKEN, "rust-async", &EntityId::from(10))
            .await
            .unwrap_err();
        assert_eq!(refused.status(), Some(403));
    }

    #[tokio::test]
    async fn test_newsletter() {
        let api = FakeApi::start().await;
        let client = api.client();

        client.subscribe_newsletter("reader@example.com").await.unwrap();
        let err = client.subscribe_newsletter("taken@example.com").await.unwrap_err();
        assert_eq!(err.to_string(), "Already subscribed.");
    }

    #[tokio::test]
    async fn test_bookmarks_roundtrip() {
        let api = FakeApi::start().await;
        let client = api.client();

        let saved = client.bookmarks(GOOD_TOKEN).await.unwrap();
        assert_eq!(saved[0].slug, "rust-async");

        client.add_bookmark(GOOD_TOKEN, &EntityId::from(3)).await.unwrap();
        assert_eq!(api.last_body().unwrap()["article"], "3");

        client.remove_bookmark(GOOD_TOKEN, &EntityId::from(3)).await.unwrap();
        assert_eq!(api.hits("DELETE /api/bookmarks/3/"), 1);

        assert!(client.bookmarks("bad").await.unwrap_err().is_unauthorized());
    }
}
