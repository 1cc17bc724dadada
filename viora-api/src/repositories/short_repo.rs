use std::future::IntoFuture;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};

use crate::domain::{Follow, Short, ShortBookmark, ShortComment, ShortLike};
use crate::search::PageRequest;

use super::repo_error::{is_duplicate_key, RepositoryError};

pub(crate) const SHORTS: &str = "shorts";
pub(crate) const LIKES: &str = "shortLikes";
pub(crate) const BOOKMARKS: &str = "shortBookmarks";
pub(crate) const COMMENTS: &str = "shortComments";
pub(crate) const FOLLOWS: &str = "follows";

/// Feed selection. `author_ids` narrows to followed authors for the
/// following tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedQuery {
    pub tag: Option<String>,
    pub salon_id: Option<ObjectId>,
    pub author_ids: Option<Vec<ObjectId>>,
}

impl FeedQuery {
    pub fn to_document(&self) -> Document {
        let mut filter = doc! { "isActive": true };
        if let Some(tag) = &self.tag {
            filter.insert("tags", tag);
        }
        if let Some(salon_id) = self.salon_id {
            filter.insert("salonId", salon_id);
        }
        if let Some(author_ids) = &self.author_ids {
            filter.insert("authorId", doc! { "$in": author_ids.clone() });
        }
        filter
    }
}

#[async_trait]
pub trait ShortRepository {
    async fn feed(
        &self,
        query: &FeedQuery,
        page: &PageRequest,
    ) -> Result<(Vec<Short>, u64), RepositoryError>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Short>, RepositoryError>;
    async fn insert(&self, short: &Short) -> Result<(), RepositoryError>;
    async fn record_view(&self, id: ObjectId) -> Result<(), RepositoryError>;
    async fn like(&self, short_id: ObjectId, user_id: ObjectId) -> Result<(), RepositoryError>;
    async fn unlike(&self, short_id: ObjectId, user_id: ObjectId)
        -> Result<bool, RepositoryError>;
    async fn bookmark(&self, short_id: ObjectId, user_id: ObjectId)
        -> Result<(), RepositoryError>;
    async fn unbookmark(
        &self,
        short_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<bool, RepositoryError>;
    async fn insert_comment(&self, comment: &ShortComment) -> Result<(), RepositoryError>;
    async fn list_comments(
        &self,
        short_id: ObjectId,
        page: &PageRequest,
    ) -> Result<(Vec<ShortComment>, u64), RepositoryError>;
    async fn follow(&self, follower_id: ObjectId, author_id: ObjectId)
        -> Result<(), RepositoryError>;
    async fn unfollow(
        &self,
        follower_id: ObjectId,
        author_id: ObjectId,
    ) -> Result<bool, RepositoryError>;
    async fn followed_authors(&self, follower_id: ObjectId)
        -> Result<Vec<ObjectId>, RepositoryError>;
}

#[derive(Clone)]
pub struct ShortRepositoryImpl {
    shorts: Collection<Short>,
    likes: Collection<ShortLike>,
    bookmarks: Collection<ShortBookmark>,
    comments: Collection<ShortComment>,
    follows: Collection<Follow>,
}

impl ShortRepositoryImpl {
    pub fn new(db: Database) -> Self {
        Self {
            shorts: db.collection(SHORTS),
            likes: db.collection(LIKES),
            bookmarks: db.collection(BOOKMARKS),
            comments: db.collection(COMMENTS),
            follows: db.collection(FOLLOWS),
        }
    }

    async fn adjust_counter(
        &self,
        id: ObjectId,
        field: &str,
        delta: i64,
    ) -> Result<(), RepositoryError> {
        let mut inc = Document::new();
        inc.insert(field, delta);
        self.shorts
            .update_one(doc! { "_id": id }, doc! { "$inc": inc })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ShortRepository for ShortRepositoryImpl {
    async fn feed(
        &self,
        query: &FeedQuery,
        page: &PageRequest,
    ) -> Result<(Vec<Short>, u64), RepositoryError> {
        let filter = query.to_document();

        let find = self
            .shorts
            .find(filter.clone())
            .sort(doc! { "createdAt": -1 })
            .skip(page.skip())
            .limit(page.limit);
        let count = self.shorts.count_documents(filter);
        let (cursor, total) = tokio::try_join!(find.into_future(), count)?;

        let shorts = cursor.try_collect().await?;
        Ok((shorts, total))
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Short>, RepositoryError> {
        let short = self
            .shorts
            .find_one(doc! { "_id": id, "isActive": true })
            .await?;
        Ok(short)
    }

    async fn insert(&self, short: &Short) -> Result<(), RepositoryError> {
        self.shorts.insert_one(short).await?;
        Ok(())
    }

    async fn record_view(&self, id: ObjectId) -> Result<(), RepositoryError> {
        self.adjust_counter(id, "viewCount", 1).await
    }

    async fn like(&self, short_id: ObjectId, user_id: ObjectId) -> Result<(), RepositoryError> {
        match self.likes.insert_one(ShortLike::new(short_id, user_id)).await {
            Ok(_) => self.adjust_counter(short_id, "likeCount", 1).await,
            Err(error) if is_duplicate_key(&error) => Err(RepositoryError::AlreadyExists(
                "short is already liked".to_string(),
            )),
            Err(error) => Err(error.into()),
        }
    }

    async fn unlike(
        &self,
        short_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<bool, RepositoryError> {
        let result = self
            .likes
            .delete_one(doc! { "shortId": short_id, "userId": user_id })
            .await?;
        if result.deleted_count == 0 {
            return Ok(false);
        }
        self.adjust_counter(short_id, "likeCount", -1).await?;
        Ok(true)
    }

    async fn bookmark(
        &self,
        short_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<(), RepositoryError> {
        match self
            .bookmarks
            .insert_one(ShortBookmark::new(short_id, user_id))
            .await
        {
            Ok(_) => self.adjust_counter(short_id, "bookmarkCount", 1).await,
            Err(error) if is_duplicate_key(&error) => Err(RepositoryError::AlreadyExists(
                "short is already bookmarked".to_string(),
            )),
            Err(error) => Err(error.into()),
        }
    }

    async fn unbookmark(
        &self,
        short_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<bool, RepositoryError> {
        let result = self
            .bookmarks
            .delete_one(doc! { "shortId": short_id, "userId": user_id })
            .await?;
        if result.deleted_count == 0 {
            return Ok(false);
        }
        self.adjust_counter(short_id, "bookmarkCount", -1).await?;
        Ok(true)
    }

    async fn insert_comment(&self, comment: &ShortComment) -> Result<(), RepositoryError> {
        self.comments.insert_one(comment).await?;
        self.adjust_counter(comment.short_id, "commentCount", 1)
            .await
    }

    async fn list_comments(
        &self,
        short_id: ObjectId,
        page: &PageRequest,
    ) -> Result<(Vec<ShortComment>, u64), RepositoryError> {
        let filter = doc! { "shortId": short_id };

        let find = self
            .comments
            .find(filter.clone())
            .sort(doc! { "createdAt": -1 })
            .skip(page.skip())
            .limit(page.limit);
        let count = self.comments.count_documents(filter);
        let (cursor, total) = tokio::try_join!(find.into_future(), count)?;

        let comments = cursor.try_collect().await?;
        Ok((comments, total))
    }

    async fn follow(
        &self,
        follower_id: ObjectId,
        author_id: ObjectId,
    ) -> Result<(), RepositoryError> {
        match self
            .follows
            .insert_one(Follow::new(follower_id, author_id))
            .await
        {
            Ok(_) => Ok(()),
            Err(error) if is_duplicate_key(&error) => Err(RepositoryError::AlreadyExists(
                "author is already followed".to_string(),
            )),
            Err(error) => Err(error.into()),
        }
    }

    async fn unfollow(
        &self,
        follower_id: ObjectId,
        author_id: ObjectId,
    ) -> Result<bool, RepositoryError> {
        let result = self
            .follows
            .delete_one(doc! { "followerId": follower_id, "authorId": author_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn followed_authors(
        &self,
        follower_id: ObjectId,
    ) -> Result<Vec<ObjectId>, RepositoryError> {
        let cursor = self.follows.find(doc! { "followerId": follower_id }).await?;
        let follows: Vec<Follow> = cursor.try_collect().await?;
        Ok(follows.into_iter().map(|follow| follow.author_id).collect())
    }
}
