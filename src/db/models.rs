use sqlx::FromRow;

/// Opaque 128-bit ids, generated with `rand` and rendered as lowercase hex.
pub fn new_id() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// Current time as milliseconds since the Unix epoch, the storage form for
/// every timestamp column so the schema runs unmodified across backends.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub expires_at: i64,
    pub created_at: i64,
}

pub const VISIBILITY_DRAFT: &str = "draft";
pub const VISIBILITY_PUBLISHED: &str = "published";
pub const VISIBILITY_UNLISTED: &str = "unlisted";

pub const COVER_BG_MODE_DEFAULT: &str = "default";
pub const COVER_BG_MODE_NONE: &str = "none";
pub const COVER_BG_MODE_CUSTOM: &str = "custom";

#[derive(Debug, Clone, FromRow)]
pub struct Book {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub author: String,
    pub position: i64,
    pub visibility: String,
    pub cover_bg_mode: String,
    pub cover_bg_custom_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Chapter {
    pub id: String,
    pub book_id: String,
    pub title: String,
    pub position: i64,
    pub file_path: Option<String>,
    pub html_content: Option<String>,
    pub bg: Option<String>,
    pub bg_mobile: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

pub const PAGE_TEXTURE_DEFAULT: &str = "default";
pub const PAGE_TEXTURE_NONE: &str = "none";
pub const PAGE_TEXTURE_CUSTOM: &str = "custom";

#[derive(Debug, Clone, FromRow)]
pub struct BookAppearance {
    pub book_id: String,
    pub font_min: i32,
    pub font_max: i32,
    pub light_cover_bg_start: String,
    pub light_cover_bg_end: String,
    pub light_cover_text: String,
    pub light_cover_bg_image_url: Option<String>,
    pub light_page_texture: String,
    pub light_custom_texture_url: Option<String>,
    pub light_bg_page: String,
    pub light_bg_app: String,
    pub dark_cover_bg_start: String,
    pub dark_cover_bg_end: String,
    pub dark_cover_text: String,
    pub dark_cover_bg_image_url: Option<String>,
    pub dark_page_texture: String,
    pub dark_custom_texture_url: Option<String>,
    pub dark_bg_page: String,
    pub dark_bg_app: String,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct BookSounds {
    pub book_id: String,
    pub page_flip: Option<String>,
    pub book_open: Option<String>,
    pub book_close: Option<String>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct BookDefaultSettings {
    pub book_id: String,
    pub font: String,
    pub font_size: i32,
    pub theme: String,
    pub sound_enabled: bool,
    pub sound_volume: f64,
    pub ambient_type: Option<String>,
    pub ambient_volume: f64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct Ambient {
    pub id: String,
    pub book_id: String,
    pub ambient_key: String,
    pub label: String,
    pub short_label: Option<String>,
    pub icon: Option<String>,
    pub file_url: Option<String>,
    pub visible: bool,
    pub builtin: bool,
    pub position: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct DecorativeFont {
    pub book_id: String,
    pub name: String,
    pub file_url: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReadingFont {
    pub id: String,
    pub user_id: String,
    pub font_key: String,
    pub label: String,
    pub family: String,
    pub builtin: bool,
    pub enabled: bool,
    pub file_url: Option<String>,
    pub position: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct GlobalSettings {
    pub user_id: String,
    pub font_min: i32,
    pub font_max: i32,
    pub visibility_font_size: bool,
    pub visibility_theme: bool,
    pub visibility_font: bool,
    pub visibility_fullscreen: bool,
    pub visibility_sound: bool,
    pub visibility_ambient: bool,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReadingProgress {
    pub user_id: String,
    pub book_id: String,
    pub page: i32,
    pub font: Option<String>,
    pub font_size: Option<i32>,
    pub theme: Option<String>,
    pub sound_enabled: bool,
    pub sound_volume: f64,
    pub ambient_type: Option<String>,
    pub ambient_volume: f64,
    pub updated_at: i64,
}

/// The five builtin reading fonts seeded for every new user, matching the
/// teacher's pattern of seeding fixed rows on first use.
pub const BUILTIN_READING_FONTS: &[(&str, &str, &str)] = &[
    ("serif", "Serif", "Georgia, 'Times New Roman', serif"),
    ("sans", "Sans-serif", "'Helvetica Neue', Arial, sans-serif"),
    ("mono", "Monospace", "'Courier New', monospace"),
    ("dyslexic", "OpenDyslexic", "'OpenDyslexic', sans-serif"),
    ("rounded", "Rounded", "'Varela Round', sans-serif"),
];
