//! Internal Diesel row structs and their conversions to domain types.
//!
//! Rows never leave the persistence layer. Conversions back into the domain
//! re-run validation, so a row that no longer satisfies the domain rules
//! surfaces as a query error instead of a malformed entity.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    BlobPath, Like, LikeKey, Nickname, PasswordHash, Post, PostContent, PostId, User, UserId,
};

use super::schema::{likes, posts, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub nickname: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_domain(self) -> Result<User, String> {
        let nickname = Nickname::new(self.nickname)
            .map_err(|err| format!("stored user {} has invalid nickname: {err}", self.id))?;
        let password_hash = PasswordHash::new(self.password_hash)
            .map_err(|err| format!("stored user {} has invalid hash: {err}", self.id))?;
        Ok(User::new(
            UserId::from_uuid(self.id),
            nickname,
            password_hash,
            self.created_at,
        ))
    }
}

/// Insertable struct for creating user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub nickname: &'a str,
    pub password_hash: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a User> for NewUserRow<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: *user.id().as_uuid(),
            nickname: user.nickname().as_ref(),
            password_hash: user.password_hash().as_ref(),
            created_at: user.created_at(),
        }
    }
}

/// Row struct for reading from the posts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub nickname: String,
    pub comment: String,
    pub shop_name: Option<String>,
    pub price: Option<i32>,
    pub image_path: String,
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
}

impl PostRow {
    pub(crate) fn into_domain(self) -> Result<Post, String> {
        let id = self.id;
        let invalid = |field: &str, err: &dyn std::fmt::Display| {
            format!("stored post {id} has invalid {field}: {err}")
        };
        let nickname = Nickname::new(self.nickname).map_err(|err| invalid("nickname", &err))?;
        let price = self
            .price
            .map(u32::try_from)
            .transpose()
            .map_err(|err| invalid("price", &err))?;
        let content = PostContent::new(self.comment, self.shop_name, price)
            .map_err(|err| invalid("content", &err))?;
        let image_path =
            BlobPath::new(self.image_path).map_err(|err| invalid("image_path", &err))?;
        let like_count =
            u32::try_from(self.like_count).map_err(|err| invalid("like_count", &err))?;

        Ok(Post {
            id: PostId::from_uuid(id),
            user_id: UserId::from_uuid(self.user_id),
            nickname,
            content,
            image_path,
            like_count,
            created_at: self.created_at,
        })
    }
}

/// Insertable struct for creating post records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub(crate) struct NewPostRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub nickname: &'a str,
    pub comment: &'a str,
    pub shop_name: Option<&'a str>,
    pub price: Option<i32>,
    pub image_path: &'a str,
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
}

impl<'a> NewPostRow<'a> {
    pub(crate) fn try_from_post(post: &'a Post) -> Result<Self, String> {
        Ok(Self {
            id: *post.id.as_uuid(),
            user_id: *post.user_id.as_uuid(),
            nickname: post.nickname.as_ref(),
            comment: &post.content.comment,
            shop_name: post.content.shop_name.as_deref(),
            price: price_for_db(post.content.price)?,
            image_path: post.image_path.as_ref(),
            like_count: i32::try_from(post.like_count)
                .map_err(|_| format!("like_count {} exceeds column range", post.like_count))?,
            created_at: post.created_at,
        })
    }
}

/// Changeset for the owner-editable post columns.
///
/// `treat_none_as_null` lets an edit clear the shop name or price.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = posts)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct PostContentUpdate<'a> {
    pub comment: &'a str,
    pub shop_name: Option<&'a str>,
    pub price: Option<i32>,
}

impl<'a> PostContentUpdate<'a> {
    pub(crate) fn try_from_content(content: &'a PostContent) -> Result<Self, String> {
        Ok(Self {
            comment: &content.comment,
            shop_name: content.shop_name.as_deref(),
            price: price_for_db(content.price)?,
        })
    }
}

fn price_for_db(price: Option<u32>) -> Result<Option<i32>, String> {
    price
        .map(|value| i32::try_from(value).map_err(|_| format!("price {value} exceeds column range")))
        .transpose()
}

/// Row struct for reading from and inserting into the likes table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LikeRow {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<LikeRow> for Like {
    fn from(row: LikeRow) -> Self {
        Like::new(
            LikeKey::new(UserId::from_uuid(row.user_id), PostId::from_uuid(row.post_id)),
            row.created_at,
        )
    }
}

impl From<&Like> for LikeRow {
    fn from(like: &Like) -> Self {
        Self {
            user_id: *like.key.user_id.as_uuid(),
            post_id: *like.key.post_id.as_uuid(),
            created_at: like.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn post_row() -> PostRow {
        PostRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            nickname: "alice".into(),
            comment: "Ramen".into(),
            shop_name: Some("Menya".into()),
            price: Some(950),
            image_path: "images/ramen.jpg".into(),
            like_count: 3,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn post_row_converts_to_domain() {
        let row = post_row();
        let id = row.id;

        let post = row.into_domain().expect("valid row");

        assert_eq!(*post.id.as_uuid(), id);
        assert_eq!(post.content.price, Some(950));
        assert_eq!(post.like_count, 3);
    }

    #[rstest]
    #[case::negative_count(PostRow { like_count: -1, ..post_row() }, "like_count")]
    #[case::negative_price(PostRow { price: Some(-5), ..post_row() }, "price")]
    #[case::blank_comment(PostRow { comment: "  ".into(), ..post_row() }, "content")]
    #[case::blank_image(PostRow { image_path: String::new(), ..post_row() }, "image_path")]
    fn corrupt_post_rows_are_rejected(#[case] row: PostRow, #[case] field: &str) {
        let err = row.into_domain().expect_err("corrupt row");
        assert!(err.contains(field), "{err}");
    }

    #[rstest]
    fn new_post_row_round_trips_the_content() {
        let post = post_row().into_domain().expect("valid row");

        let row = NewPostRow::try_from_post(&post).expect("insertable");

        assert_eq!(row.comment, "Ramen");
        assert_eq!(row.shop_name, Some("Menya"));
        assert_eq!(row.price, Some(950));
        assert_eq!(row.image_path, "images/ramen.jpg");
    }

    #[rstest]
    fn oversized_price_is_rejected_for_storage() {
        let content = PostContent::new("Caviar", None, Some(u32::MAX)).expect("content");
        let err = PostContentUpdate::try_from_content(&content).expect_err("out of range");
        assert!(err.contains("price"));
    }

    #[rstest]
    fn user_row_with_bad_nickname_is_rejected() {
        let row = UserRow {
            id: Uuid::new_v4(),
            nickname: " padded ".into(),
            password_hash: "digest".into(),
            created_at: Utc::now(),
        };
        assert!(row.into_domain().is_err());
    }
}
