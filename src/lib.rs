pub mod builder;
pub mod config;
pub mod error;
pub mod events;
pub mod keymap;
pub mod midicsv;
pub mod player;
pub mod playlist;
pub mod tempo;
pub mod window;

pub use builder::{build_macro, macro_from_path, macro_from_str, roll_chords};
pub use config::Config;
pub use error::BuildError;
pub use events::{MacroEvent, total_duration};
pub use keymap::KeyLayout;
pub use player::{
    KeySink, Outcome, PlaybackControl, Player, PlayerState, PlayerUpdate, TracingSink, play_macro,
};
pub use tempo::{TempoMap, TempoSegment};
pub use window::fit_to_window;
