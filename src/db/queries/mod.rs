pub mod ambients;
pub mod books;
pub mod chapters;
pub mod password_reset;
pub mod reading_fonts;
pub mod reading_progress;
pub mod sessions;
pub mod sub_resources;
pub mod users;
