pub mod blocked_post;
pub mod category;
pub mod comment;
pub mod favourite_post;
pub mod follow;
pub mod notification;
pub mod pending_post;
pub mod post;
pub mod post_like;
pub mod post_tag;
pub mod recommended_friend;
pub mod tag;
pub mod user;
pub mod user_action;

pub use comment::CommentStatus;
pub use notification::{NotificationKind, NotificationStatus};
pub use post::PostStatus;
pub use user::Role;
pub use user_action::{ActionStatus, UserActionType};
