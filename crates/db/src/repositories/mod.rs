mod content_repo;
mod subscriber_repo;

pub use content_repo::ContentRepo;
pub use subscriber_repo::SubscriberRepo;
