//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions mirror `backend/migrations` and must change with them.
//! `diesel print-schema` against a migrated database regenerates them.

diesel::table! {
    /// Registered accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique, case-sensitive nickname (max 32 characters).
        nickname -> Varchar,
        /// Credential digest produced by the configured hasher.
        password_hash -> Varchar,
        /// Registration timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Lunch posts.
    posts (id) {
        id -> Uuid,
        /// Owning user.
        user_id -> Uuid,
        /// Author nickname copied at post time.
        nickname -> Varchar,
        comment -> Text,
        shop_name -> Nullable<Varchar>,
        /// Non-negative price, enforced by a check constraint.
        price -> Nullable<Int4>,
        /// Relative blob key of the post image.
        image_path -> Varchar,
        /// Cached number of `likes` rows for this post; never negative.
        like_count -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per (user, post) like.
    likes (user_id, post_id) {
        user_id -> Uuid,
        post_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(posts -> users (user_id));
diesel::joinable!(likes -> posts (post_id));

diesel::allow_tables_to_appear_in_same_query!(users, posts, likes);
