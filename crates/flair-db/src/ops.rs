use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use flair_core::models::collection::{Collection, CollectionId};
use flair_core::models::community_post::{CommunityPost, PostId};
use flair_core::models::product::{Product, SavedItem};
use flair_core::models::profile::{Profile, ProfileId};

use crate::Result;

// ── Helpers ──

fn parse_dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Fixed-width timestamps so text ordering matches time ordering.
fn fmt_dt(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap_or_default()
}

// ── Profiles ──

const PROFILE_COLUMNS: &str = "
    p.id, p.external_id, p.username, p.display_name, p.bio, p.avatar_url, p.data, p.is_public, p.created_at,
    (SELECT COUNT(*) FROM follows f WHERE f.followee_id = p.id),
    (SELECT COUNT(*) FROM follows f WHERE f.follower_id = p.id)";

pub fn insert_profile(conn: &Connection, profile: &Profile) -> Result<()> {
    conn.execute(
        "INSERT INTO profiles (id, external_id, username, display_name, bio, avatar_url, data, is_public, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            profile.id.0.to_string(),
            profile.external_id,
            profile.username,
            profile.display_name,
            profile.bio,
            profile.avatar_url,
            serde_json::to_string(&profile.data)?,
            profile.is_public as i32,
            fmt_dt(&profile.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_profile(conn: &Connection, id: &ProfileId) -> Result<Option<Profile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles p WHERE p.id = ?1");
    let profile = conn
        .query_row(&sql, params![id.0.to_string()], row_to_profile)
        .optional()?;
    Ok(profile)
}

pub fn get_profile_id_by_external_id(
    conn: &Connection,
    external_id: &str,
) -> Result<Option<ProfileId>> {
    let id: Option<String> = conn
        .query_row(
            "SELECT id FROM profiles WHERE external_id = ?1",
            params![external_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id.map(|s| ProfileId::from_uuid(parse_uuid(&s))))
}

pub fn profile_exists(conn: &Connection, id: &ProfileId) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM profiles WHERE id = ?1",
            params![id.0.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Insert a default profile for `external_id`. If another writer inserted it
/// first, the unique constraint fires and the existing row's id is returned.
pub fn create_or_fetch_profile(conn: &Connection, external_id: &str) -> Result<ProfileId> {
    let profile = Profile::new(external_id);
    match insert_profile(conn, &profile) {
        Ok(()) => {
            tracing::info!(profile_id = %profile.id, "created profile");
            Ok(profile.id)
        }
        Err(e) if e.is_conflict() => {
            tracing::warn!("profile insert raced with another writer, re-reading");
            match get_profile_id_by_external_id(conn, external_id)? {
                Some(id) => Ok(id),
                None => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}

/// Map an external identity to its internal profile id, creating the profile on first use.
pub fn resolve_profile_id(conn: &Connection, external_id: &str) -> Result<ProfileId> {
    match get_profile_id_by_external_id(conn, external_id)? {
        Some(id) => Ok(id),
        None => create_or_fetch_profile(conn, external_id),
    }
}

pub fn update_profile(conn: &Connection, profile: &Profile) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE profiles SET username = ?1, display_name = ?2, bio = ?3, avatar_url = ?4, data = ?5, is_public = ?6
         WHERE id = ?7",
        params![
            profile.username,
            profile.display_name,
            profile.bio,
            profile.avatar_url,
            serde_json::to_string(&profile.data)?,
            profile.is_public as i32,
            profile.id.0.to_string(),
        ],
    )?;
    Ok(changed > 0)
}

fn row_to_profile(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
    let id_str: String = row.get(0)?;
    let data_str: String = row.get(6)?;
    let is_public: i32 = row.get(7)?;
    let created_str: String = row.get(8)?;
    let followers: i64 = row.get(9)?;
    let following: i64 = row.get(10)?;

    Ok(Profile {
        id: ProfileId::from_uuid(parse_uuid(&id_str)),
        external_id: row.get(1)?,
        username: row.get(2)?,
        display_name: row.get(3)?,
        bio: row.get(4)?,
        avatar_url: row.get(5)?,
        data: serde_json::from_str(&data_str)
            .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new())),
        is_public: is_public != 0,
        follower_count: followers as u32,
        following_count: following as u32,
        created_at: parse_dt(&created_str),
    })
}

// ── Follows ──

/// Returns false when the follow already existed.
pub fn insert_follow(conn: &Connection, follower: &ProfileId, followee: &ProfileId) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO follows (follower_id, followee_id, created_at) VALUES (?1, ?2, ?3)",
        params![
            follower.0.to_string(),
            followee.0.to_string(),
            fmt_dt(&Utc::now()),
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_follow(conn: &Connection, follower: &ProfileId, followee: &ProfileId) -> Result<bool> {
    let changed = conn.execute(
        "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
        params![follower.0.to_string(), followee.0.to_string()],
    )?;
    Ok(changed > 0)
}

pub fn is_following(conn: &Connection, follower: &ProfileId, followee: &ProfileId) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
            params![follower.0.to_string(), followee.0.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

// ── Saved Items ──

/// Idempotent insert. Returns false when the (profile, product) row already existed.
pub fn insert_saved_item(conn: &Connection, item: &SavedItem) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO saved_items (profile_id, product_id, product_data, saved_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            item.profile_id.0.to_string(),
            item.product.id,
            serde_json::to_string(&item.product)?,
            fmt_dt(&item.saved_at),
        ],
    )?;
    Ok(changed > 0)
}

/// Insert or refresh the snapshot in place. Memberships of an existing row survive.
pub fn upsert_saved_item(conn: &Connection, item: &SavedItem) -> Result<()> {
    conn.execute(
        "INSERT INTO saved_items (profile_id, product_id, product_data, saved_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (profile_id, product_id)
         DO UPDATE SET product_data = excluded.product_data, saved_at = excluded.saved_at",
        params![
            item.profile_id.0.to_string(),
            item.product.id,
            serde_json::to_string(&item.product)?,
            fmt_dt(&item.saved_at),
        ],
    )?;
    Ok(())
}

/// Newest first.
pub fn list_saved_items(conn: &Connection, profile_id: &ProfileId) -> Result<Vec<SavedItem>> {
    let mut stmt = conn.prepare(
        "SELECT profile_id, product_id, product_data, saved_at
         FROM saved_items WHERE profile_id = ?1 ORDER BY saved_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map(params![profile_id.0.to_string()], row_to_saved_item)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn list_saved_product_ids(conn: &Connection, profile_id: &ProfileId) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT product_id FROM saved_items WHERE profile_id = ?1 ORDER BY rowid")?;
    let rows = stmt.query_map(params![profile_id.0.to_string()], |row| row.get(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
}

pub fn is_saved(conn: &Connection, profile_id: &ProfileId, product_id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM saved_items WHERE profile_id = ?1 AND product_id = ?2",
            params![profile_id.0.to_string(), product_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Deletes the saved row; collection memberships go with it via the FK cascade.
pub fn delete_saved_item(conn: &Connection, profile_id: &ProfileId, product_id: &str) -> Result<bool> {
    let changed = conn.execute(
        "DELETE FROM saved_items WHERE profile_id = ?1 AND product_id = ?2",
        params![profile_id.0.to_string(), product_id],
    )?;
    Ok(changed > 0)
}

fn row_to_saved_item(row: &rusqlite::Row) -> rusqlite::Result<SavedItem> {
    let profile_str: String = row.get(0)?;
    let product_id: String = row.get(1)?;
    let data_str: String = row.get(2)?;
    let saved_str: String = row.get(3)?;

    let product = serde_json::from_str(&data_str).unwrap_or_else(|e| {
        tracing::warn!(%product_id, error = %e, "unreadable product snapshot");
        Product::new(product_id.clone(), "")
    });

    Ok(SavedItem {
        profile_id: ProfileId::from_uuid(parse_uuid(&profile_str)),
        product,
        saved_at: parse_dt(&saved_str),
    })
}

// ── Collections ──

const COLLECTION_COLUMNS: &str = "
    c.id, c.profile_id, c.name, c.color, c.description, c.custom_banner_url, c.is_public, c.created_at,
    (SELECT COUNT(*) FROM collection_items ci WHERE ci.collection_id = c.id)";

pub fn insert_collection(conn: &Connection, col: &Collection) -> Result<()> {
    conn.execute(
        "INSERT INTO collections (id, profile_id, name, color, description, custom_banner_url, is_public, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            col.id.0.to_string(),
            col.profile_id.0.to_string(),
            col.name,
            col.color,
            col.description,
            col.custom_banner,
            col.is_public as i32,
            fmt_dt(&col.created_at),
        ],
    )?;
    Ok(())
}

/// Fetch a collection only if `profile_id` owns it.
pub fn get_collection(
    conn: &Connection,
    profile_id: &ProfileId,
    id: &CollectionId,
) -> Result<Option<Collection>> {
    let sql = format!(
        "SELECT {COLLECTION_COLUMNS} FROM collections c WHERE c.id = ?1 AND c.profile_id = ?2"
    );
    let col = conn
        .query_row(
            &sql,
            params![id.0.to_string(), profile_id.0.to_string()],
            row_to_collection,
        )
        .optional()?;
    match col {
        Some(mut col) => {
            col.item_ids = list_collection_item_ids(conn, id)?;
            Ok(Some(col))
        }
        None => Ok(None),
    }
}

/// Oldest first; rowid breaks ties between equal timestamps.
pub fn list_collections(conn: &Connection, profile_id: &ProfileId) -> Result<Vec<Collection>> {
    let sql = format!(
        "SELECT {COLLECTION_COLUMNS} FROM collections c WHERE c.profile_id = ?1
         ORDER BY c.created_at ASC, c.rowid ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![profile_id.0.to_string()], row_to_collection)?;
    let mut collections = rows.collect::<rusqlite::Result<Vec<_>>>()?;

    let mut members = list_profile_memberships(conn, profile_id)?;
    for col in &mut collections {
        col.item_ids = members.remove(&col.id).unwrap_or_default();
    }
    Ok(collections)
}

pub fn count_collections(conn: &Connection, profile_id: &ProfileId) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM collections WHERE profile_id = ?1",
        params![profile_id.0.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Writes the mutable columns back. Returns false if the row is missing or owned by someone else.
pub fn update_collection(conn: &Connection, col: &Collection) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE collections SET name = ?1, color = ?2, description = ?3, custom_banner_url = ?4, is_public = ?5
         WHERE id = ?6 AND profile_id = ?7",
        params![
            col.name,
            col.color,
            col.description,
            col.custom_banner,
            col.is_public as i32,
            col.id.0.to_string(),
            col.profile_id.0.to_string(),
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_collection(conn: &Connection, profile_id: &ProfileId, id: &CollectionId) -> Result<bool> {
    let changed = conn.execute(
        "DELETE FROM collections WHERE id = ?1 AND profile_id = ?2",
        params![id.0.to_string(), profile_id.0.to_string()],
    )?;
    Ok(changed > 0)
}

fn row_to_collection(row: &rusqlite::Row) -> rusqlite::Result<Collection> {
    let id_str: String = row.get(0)?;
    let profile_str: String = row.get(1)?;
    let is_public: i32 = row.get(6)?;
    let created_str: String = row.get(7)?;
    let item_count: i64 = row.get(8)?;

    Ok(Collection {
        id: CollectionId::from_uuid(parse_uuid(&id_str)),
        profile_id: ProfileId::from_uuid(parse_uuid(&profile_str)),
        name: row.get(2)?,
        color: row.get(3)?,
        description: row.get(4)?,
        custom_banner: row.get(5)?,
        item_ids: Vec::new(),
        item_count: item_count as usize,
        is_public: is_public != 0,
        created_at: parse_dt(&created_str),
    })
}

// ── Collection Items ──

/// Returns false when the product was already a member.
pub fn add_collection_item(
    conn: &Connection,
    profile_id: &ProfileId,
    collection_id: &CollectionId,
    product_id: &str,
) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO collection_items (collection_id, profile_id, product_id, added_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            collection_id.0.to_string(),
            profile_id.0.to_string(),
            product_id,
            fmt_dt(&Utc::now()),
        ],
    )?;
    Ok(changed > 0)
}

pub fn remove_collection_item(
    conn: &Connection,
    profile_id: &ProfileId,
    collection_id: &CollectionId,
    product_id: &str,
) -> Result<bool> {
    let changed = conn.execute(
        "DELETE FROM collection_items WHERE collection_id = ?1 AND profile_id = ?2 AND product_id = ?3",
        params![
            collection_id.0.to_string(),
            profile_id.0.to_string(),
            product_id,
        ],
    )?;
    Ok(changed > 0)
}

/// Member product ids in insertion order.
pub fn list_collection_item_ids(conn: &Connection, collection_id: &CollectionId) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT product_id FROM collection_items WHERE collection_id = ?1
         ORDER BY added_at ASC, rowid ASC",
    )?;
    let rows = stmt.query_map(params![collection_id.0.to_string()], |row| row.get(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
}

/// Collections of `profile_id` that currently hold `product_id`.
pub fn collections_containing(
    conn: &Connection,
    profile_id: &ProfileId,
    product_id: &str,
) -> Result<Vec<CollectionId>> {
    let mut stmt = conn.prepare(
        "SELECT collection_id FROM collection_items WHERE profile_id = ?1 AND product_id = ?2",
    )?;
    let rows = stmt.query_map(params![profile_id.0.to_string(), product_id], |row| {
        let id_str: String = row.get(0)?;
        Ok(CollectionId::from_uuid(parse_uuid(&id_str)))
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn list_profile_memberships(
    conn: &Connection,
    profile_id: &ProfileId,
) -> Result<HashMap<CollectionId, Vec<String>>> {
    let mut stmt = conn.prepare(
        "SELECT collection_id, product_id FROM collection_items WHERE profile_id = ?1
         ORDER BY added_at ASC, rowid ASC",
    )?;
    let mut rows = stmt.query(params![profile_id.0.to_string()])?;
    let mut members: HashMap<CollectionId, Vec<String>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let id_str: String = row.get(0)?;
        let product_id: String = row.get(1)?;
        members
            .entry(CollectionId::from_uuid(parse_uuid(&id_str)))
            .or_default()
            .push(product_id);
    }
    Ok(members)
}

// ── Community Posts ──

const POST_COLUMNS: &str = "id, profile_id, collection_id, title, description, is_public,
    likes_count, comments_count, views_count, shares_count, created_at, updated_at";

pub fn insert_post(conn: &Connection, post: &CommunityPost) -> Result<()> {
    conn.execute(
        "INSERT INTO community_posts (id, profile_id, collection_id, title, description, is_public,
             likes_count, comments_count, views_count, shares_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            post.id.0.to_string(),
            post.profile_id.0.to_string(),
            post.collection_id.0.to_string(),
            post.title,
            post.description,
            post.is_public as i32,
            post.likes_count as i64,
            post.comments_count as i64,
            post.views_count as i64,
            post.shares_count as i64,
            fmt_dt(&post.created_at),
            fmt_dt(&post.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_post_for_collection(
    conn: &Connection,
    profile_id: &ProfileId,
    collection_id: &CollectionId,
) -> Result<Option<CommunityPost>> {
    let sql = format!(
        "SELECT {POST_COLUMNS} FROM community_posts WHERE profile_id = ?1 AND collection_id = ?2"
    );
    let post = conn
        .query_row(
            &sql,
            params![profile_id.0.to_string(), collection_id.0.to_string()],
            row_to_post,
        )
        .optional()?;
    Ok(post)
}

pub fn update_post_content(
    conn: &Connection,
    id: &PostId,
    title: &str,
    description: &str,
) -> Result<()> {
    conn.execute(
        "UPDATE community_posts SET title = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
        params![title, description, fmt_dt(&Utc::now()), id.0.to_string()],
    )?;
    Ok(())
}

pub fn delete_post_for_collection(
    conn: &Connection,
    profile_id: &ProfileId,
    collection_id: &CollectionId,
) -> Result<bool> {
    let changed = conn.execute(
        "DELETE FROM community_posts WHERE profile_id = ?1 AND collection_id = ?2",
        params![profile_id.0.to_string(), collection_id.0.to_string()],
    )?;
    Ok(changed > 0)
}

/// Public feed, newest first.
pub fn list_public_posts(conn: &Connection, limit: u32) -> Result<Vec<CommunityPost>> {
    let sql = format!(
        "SELECT {POST_COLUMNS} FROM community_posts WHERE is_public = 1
         ORDER BY created_at DESC, rowid DESC LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit], row_to_post)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn list_posts_for_profile(conn: &Connection, profile_id: &ProfileId) -> Result<Vec<CommunityPost>> {
    let sql = format!(
        "SELECT {POST_COLUMNS} FROM community_posts WHERE profile_id = ?1
         ORDER BY created_at DESC, rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![profile_id.0.to_string()], row_to_post)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn row_to_post(row: &rusqlite::Row) -> rusqlite::Result<CommunityPost> {
    let id_str: String = row.get(0)?;
    let profile_str: String = row.get(1)?;
    let collection_str: String = row.get(2)?;
    let is_public: i32 = row.get(5)?;
    let likes: i64 = row.get(6)?;
    let comments: i64 = row.get(7)?;
    let views: i64 = row.get(8)?;
    let shares: i64 = row.get(9)?;
    let created_str: String = row.get(10)?;
    let updated_str: String = row.get(11)?;

    Ok(CommunityPost {
        id: PostId::from_uuid(parse_uuid(&id_str)),
        profile_id: ProfileId::from_uuid(parse_uuid(&profile_str)),
        collection_id: CollectionId::from_uuid(parse_uuid(&collection_str)),
        title: row.get(3)?,
        description: row.get(4)?,
        is_public: is_public != 0,
        likes_count: likes as u32,
        comments_count: comments as u32,
        views_count: views as u32,
        shares_count: shares as u32,
        created_at: parse_dt(&created_str),
        updated_at: parse_dt(&updated_str),
    })
}
