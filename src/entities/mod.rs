pub mod prelude;

pub mod anime_platforms;
pub mod discussion_comments;
pub mod discussion_likes;
pub mod discussions;
pub mod platforms;
pub mod tracker;
pub mod users;
