//! Sequential playback of several files with a gap between entries.
//!
//! While one entry plays, the next entry's macro is built on a pre-warm
//! thread; macro construction is pure, so it can overlap freely with the
//! running session. Entries that fail to build are skipped.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::Sender;

use crate::builder::macro_from_path;
use crate::config::Config;
use crate::events::MacroEvent;
use crate::player::{Outcome, PlaybackControl, PlayerUpdate, play_macro};

type Prewarm = JoinHandle<Option<Arc<Vec<MacroEvent>>>>;

/// Play `tracks[start..]` in order against one shared control block.
///
/// Cancellation observed anywhere (mid-song or in a gap) ends the whole
/// run. The emitted count accumulates across entries.
pub fn run(
    tracks: &[PathBuf],
    start: usize,
    config: &Config,
    control: &PlaybackControl,
    emit: &mut dyn FnMut(&str),
    updates: &Sender<PlayerUpdate>,
) -> Outcome {
    let mut emitted = 0usize;
    let mut prewarmed: Option<(PathBuf, Prewarm)> = None;

    for index in start..tracks.len() {
        if control.is_cancelled() {
            return Outcome::Cancelled { emitted };
        }

        let path = &tracks[index];
        let events = match prewarmed.take() {
            // A pre-warm only counts if it was for this entry; a stale one
            // (playlist reordered underneath us) is discarded.
            Some((warm_path, handle)) if warm_path == *path => handle.join().ok().flatten(),
            _ => build_entry(path, config),
        };

        let Some(events) = events else {
            continue;
        };

        // Start building the next entry while this one plays.
        if let Some(next) = tracks.get(index + 1) {
            prewarmed = Some((next.clone(), spawn_prewarm(next.clone(), config.clone())));
        }

        let _ = updates.send(PlayerUpdate::TrackStarted {
            index,
            path: path.clone(),
        });
        tracing::info!(track = %path.display(), "playing");

        let mut report = |i: usize, elapsed: f64, total: f64| {
            let _ = updates.send(PlayerUpdate::Progress {
                index: i,
                elapsed,
                total,
            });
        };

        match play_macro(&events, control, emit, Some(&mut report)) {
            Outcome::Finished { emitted: n } => emitted += n,
            Outcome::Cancelled { emitted: n } => {
                return Outcome::Cancelled {
                    emitted: emitted + n,
                };
            }
        }

        let gap_remains = index + 1 < tracks.len();
        if gap_remains && !control.sleep_unless_cancelled(Duration::from_secs_f64(config.playlist_gap))
        {
            return Outcome::Cancelled { emitted };
        }
    }

    Outcome::Finished { emitted }
}

fn spawn_prewarm(path: PathBuf, config: Config) -> Prewarm {
    std::thread::spawn(move || build_entry(&path, &config))
}

fn build_entry(path: &Path, config: &Config) -> Option<Arc<Vec<MacroEvent>>> {
    match macro_from_path(path, config) {
        Ok(events) => Some(Arc::new(events)),
        Err(e) => {
            tracing::warn!(track = %path.display(), error = %e, "skipping unplayable entry");
            None
        }
    }
}
