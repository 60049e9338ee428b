mod account_repository;
mod comment_repository;
mod like_repository;
mod media_repository;
mod post_repository;
mod profile_repository;
mod service_repository;

pub use account_repository::AccountRepository;
pub use comment_repository::CommentRepository;
pub use like_repository::LikeRepository;
pub use media_repository::MediaRepository;
pub use post_repository::PostRepository;
pub use profile_repository::ProfileRepository;
pub use service_repository::ServiceRepository;
