pub mod hugging_face;
pub mod placeholder;
pub mod replicate;
pub mod stability;

pub use hugging_face::HuggingFace;
pub use placeholder::Placeholder;
pub use replicate::Replicate;
pub use stability::Stability;
