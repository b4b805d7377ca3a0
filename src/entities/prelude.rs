pub use super::anime_platforms::Entity as AnimePlatforms;
pub use super::discussion_comments::Entity as DiscussionComments;
pub use super::discussion_likes::Entity as DiscussionLikes;
pub use super::discussions::Entity as Discussions;
pub use super::platforms::Entity as Platforms;
pub use super::tracker::Entity as Tracker;
pub use super::users::Entity as Users;
