/// SQL statements for creating the Flair database schema.

pub const CREATE_SCHEMA_VERSION: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL
)";

pub const CREATE_PROFILES: &str = "
CREATE TABLE IF NOT EXISTS profiles (
    id              TEXT PRIMARY KEY,
    external_id     TEXT NOT NULL UNIQUE,
    username        TEXT NOT NULL,
    display_name    TEXT NOT NULL,
    bio             TEXT,
    avatar_url      TEXT,
    data            TEXT NOT NULL DEFAULT '{}',
    is_public       INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL
)";

pub const CREATE_FOLLOWS: &str = "
CREATE TABLE IF NOT EXISTS follows (
    follower_id     TEXT NOT NULL,
    followee_id     TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    PRIMARY KEY (follower_id, followee_id),
    FOREIGN KEY (follower_id) REFERENCES profiles(id) ON DELETE CASCADE,
    FOREIGN KEY (followee_id) REFERENCES profiles(id) ON DELETE CASCADE
)";

pub const CREATE_SAVED_ITEMS: &str = "
CREATE TABLE IF NOT EXISTS saved_items (
    profile_id      TEXT NOT NULL,
    product_id      TEXT NOT NULL,
    product_data    TEXT NOT NULL,
    saved_at        TEXT NOT NULL,
    PRIMARY KEY (profile_id, product_id),
    FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
)";

pub const CREATE_COLLECTIONS: &str = "
CREATE TABLE IF NOT EXISTS collections (
    id                  TEXT PRIMARY KEY,
    profile_id          TEXT NOT NULL,
    name                TEXT NOT NULL,
    color               TEXT NOT NULL,
    description         TEXT,
    custom_banner_url   TEXT,
    is_public           INTEGER NOT NULL DEFAULT 1,
    created_at          TEXT NOT NULL,
    FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
)";

/// Membership lives in its own table; a product can only be a member while
/// the same profile has it saved.
pub const CREATE_COLLECTION_ITEMS: &str = "
CREATE TABLE IF NOT EXISTS collection_items (
    collection_id   TEXT NOT NULL,
    profile_id      TEXT NOT NULL,
    product_id      TEXT NOT NULL,
    added_at        TEXT NOT NULL,
    PRIMARY KEY (collection_id, product_id),
    FOREIGN KEY (collection_id) REFERENCES collections(id) ON DELETE CASCADE,
    FOREIGN KEY (profile_id, product_id)
        REFERENCES saved_items(profile_id, product_id) ON DELETE CASCADE
)";

/// No cascade from collections: the post has to be retracted first.
pub const CREATE_COMMUNITY_POSTS: &str = "
CREATE TABLE IF NOT EXISTS community_posts (
    id              TEXT PRIMARY KEY,
    profile_id      TEXT NOT NULL,
    collection_id   TEXT NOT NULL,
    title           TEXT NOT NULL,
    description     TEXT NOT NULL,
    is_public       INTEGER NOT NULL DEFAULT 1,
    likes_count     INTEGER NOT NULL DEFAULT 0,
    comments_count  INTEGER NOT NULL DEFAULT 0,
    views_count     INTEGER NOT NULL DEFAULT 0,
    shares_count    INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    UNIQUE (profile_id, collection_id),
    FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE,
    FOREIGN KEY (collection_id) REFERENCES collections(id)
)";

pub const CREATE_INDEXES: &str = "
CREATE INDEX IF NOT EXISTS idx_collections_profile ON collections(profile_id, created_at);
CREATE INDEX IF NOT EXISTS idx_collection_items_product ON collection_items(profile_id, product_id);
CREATE INDEX IF NOT EXISTS idx_community_posts_created ON community_posts(created_at);
CREATE INDEX IF NOT EXISTS idx_follows_followee ON follows(followee_id)";

/// All table creation statements in order.
pub const ALL_TABLES: &[&str] = &[
    CREATE_SCHEMA_VERSION,
    CREATE_PROFILES,
    CREATE_FOLLOWS,
    CREATE_SAVED_ITEMS,
    CREATE_COLLECTIONS,
    CREATE_COLLECTION_ITEMS,
    CREATE_COMMUNITY_POSTS,
];
