pub mod content_record;
pub mod subscriber;
