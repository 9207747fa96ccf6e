mod config;
mod debounce;
mod error;
mod generator;
mod image;

pub mod providers;
pub mod types;
pub mod utils;

pub use config::{Config, Env, parse_dotenv};
pub use debounce::{Debouncer, SequenceGate, SequenceTicket};
pub use error::{PictorError, Result};
pub use generator::ImageGenerator;
pub use image::ImageModel;
pub use providers::{HuggingFace, Placeholder, Replicate, Stability};
pub use types::{GeneratedImage, ImageRequest, ProviderId};
