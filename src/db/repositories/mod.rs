pub mod comment_repository;
pub mod dashboard_repository;
pub mod like_repository;
pub mod ownership;
pub mod playlist_repository;
pub mod session_repository;
pub mod subscription_repository;
pub mod tweet_repository;
pub mod user_repository;
pub mod video_repository;

pub use comment_repository::{Comment, CommentRepository};
pub use dashboard_repository::{ChannelStats, DashboardRepository};
pub use like_repository::LikeRepository;
pub use ownership::{OwnedResource, ResourceOwnership};
pub use playlist_repository::{Playlist, PlaylistRepository};
pub use session_repository::PgSessionStore;
pub use subscription_repository::{ChannelInfo, SubscriptionRepository};
pub use tweet_repository::{Tweet, TweetRepository};
pub use user_repository::{ChannelProfile, User, UserRepository};
pub use video_repository::{Video, VideoRepository};
