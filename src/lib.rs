// Core modules
pub mod config;
pub mod config_file;
pub mod dependencies;
pub mod encoder;
pub mod error;
pub mod filtergraph;
pub mod intervals;
pub mod lexicon;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod recognizer;
pub mod resources;
pub mod tagging;
pub mod transcript;

// Re-export commonly used types
pub use config::{plan_output, Config, ConfigBuilder, Engine, OutputPlan};
pub use config_file::{ConfigFile, ProfileConfig};
pub use encoder::{EncodeParamTable, MediaInfo};
pub use error::{Result, WordplugError};
pub use filtergraph::{BeepMix, FilterDirective};
pub use intervals::{Interval, PadSpec};
pub use lexicon::Lexicon;
pub use progress::{ProgressOperation, ProgressTracker};
pub use recognizer::{Recognizer, VoskRecognizer, WhisperRecognizer};
pub use resources::TempFile;
pub use transcript::Word;
