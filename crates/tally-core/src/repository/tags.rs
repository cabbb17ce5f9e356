use crate::error::CoreError;
use crate::models::{Tag, TagResolution};
use sqlx::SqliteConnection;
use uuid::Uuid;

const TAG_PALETTE: [&str; 8] = [
    "#e57373", "#64b5f6", "#81c784", "#ffb74d", "#ba68c8", "#4db6ac", "#f06292", "#a1887f",
];

/// Colour given to a newly created tag. Stable for a given name.
pub fn default_tag_color(name: &str) -> &'static str {
    let hash = name
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
    TAG_PALETTE[hash as usize % TAG_PALETTE.len()]
}

/// Looks a tag up by exact, case-sensitive name and inserts it when missing.
///
/// `name` is matched as given. Template creation trims surrounding whitespace
/// before calling this, so `" Bills"` there resolves to the tag `"Bills"`.
///
/// Run inside the caller's transaction so a new tag is rolled back together
/// with whatever it was created for.
pub async fn find_or_create_tag(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<TagResolution, CoreError> {
    let existing: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(tag) = existing {
        return Ok(TagResolution {
            tag,
            created: false,
        });
    }

    let tag = Tag {
        id: Uuid::now_v7(),
        name: name.to_string(),
        color: default_tag_color(name).to_string(),
    };

    sqlx::query("INSERT INTO tags (id, name, color) VALUES ($1, $2, $3)")
        .bind(tag.id)
        .bind(&tag.name)
        .bind(&tag.color)
        .execute(&mut *conn)
        .await?;

    tracing::debug!(tag = %tag.name, "created tag");
    Ok(TagResolution { tag, created: true })
}

pub(crate) async fn tags_for_template(
    conn: &mut SqliteConnection,
    template_id: Uuid,
) -> Result<Vec<Tag>, CoreError> {
    let tags = sqlx::query_as(
        r#"SELECT t.* FROM tags t
        JOIN periodic_transaction_tags pt ON pt.tag_id = t.id
        WHERE pt.periodic_transaction_id = $1
        ORDER BY t.name"#,
    )
    .bind(template_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(tags)
}

pub(crate) async fn tags_for_transaction(
    conn: &mut SqliteConnection,
    transaction_id: Uuid,
) -> Result<Vec<Tag>, CoreError> {
    let tags = sqlx::query_as(
        r#"SELECT t.* FROM tags t
        JOIN transaction_tags tt ON tt.tag_id = t.id
        WHERE tt.transaction_id = $1
        ORDER BY t.name"#,
    )
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(tags)
}
