//! Configuration module for the toolbox.
//!
//! Settings live in a TOML file; every section falls back to defaults.

mod settings;

pub use settings::{
    CodeSettings, FetchSettings, GeneralSettings, OpenAiSettings, ScoringSettings,
    SearchSettings, ServerSettings, Settings, TranscriptionSettings, YoutubeSettings,
};
