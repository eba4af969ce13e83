pub mod settings;

pub use settings::{
    CorsConfig, GeminiConfig, LimitsConfig, ServerConfig, SessionConfig, Settings,
};
