use std::path::Path;

use crate::config::Config;
use crate::error::BuildError;
use crate::events::MacroEvent;
use crate::keymap::KeyLayout;
use crate::midicsv::{self, EventKind, Record};
use crate::tempo::TempoMap;
use crate::window::fit_to_window;

/// Build the keystroke macro for an already window-mapped record list.
///
/// Every note-on with velocity > 0 becomes a `MacroEvent` at its real time;
/// velocity-0 note-ons are note-offs in disguise and are excluded, as are
/// notes the layout cannot resolve. The result is stable-sorted by time and
/// then chord-rolled.
pub fn build_macro(
    records: &[Record],
    tempo: &TempoMap,
    layout: &KeyLayout,
    config: &Config,
) -> Vec<MacroEvent> {
    let mut events = Vec::new();

    for record in records {
        let Record::Data {
            tick,
            event: EventKind::NoteOn {
                channel,
                pitch,
                velocity,
            },
            ..
        } = record
        else {
            continue;
        };

        if *velocity == 0 {
            continue;
        }

        let Some(key) = layout.resolve(*pitch) else {
            tracing::debug!(pitch, "note outside the key table, skipped");
            continue;
        };

        events.push(MacroEvent {
            time: tempo.ticks_to_seconds(*tick),
            key: key.to_string(),
            pitch: *pitch,
            channel: *channel,
        });
    }

    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    roll_chords(&mut events, config.chord_window, config.chord_roll_step);

    events
}

/// Stagger near-simultaneous events so a monophonic actuator can play them.
///
/// Groups are anchored at their first member: every event within `window`
/// seconds of the anchor joins the group, and member k is moved to
/// `anchor + k * step`. Single left-to-right pass over an already sorted
/// list; no re-sort afterwards. With a pathologically dense cluster the
/// rolled tail can land past the next group's natural anchor; that is the
/// behavior the instrument tooling has always had, so it stays.
pub fn roll_chords(events: &mut [MacroEvent], window: f64, step: f64) {
    let mut i = 0;
    while i < events.len() {
        let anchor = events[i].time;

        let mut j = i + 1;
        while j < events.len() && events[j].time - anchor <= window {
            j += 1;
        }

        if j - i > 1 {
            for k in i..j {
                events[k].time = anchor + (k - i) as f64 * step;
            }
        }

        i = j;
    }
}

/// Full pipeline: parse, fit into the playable window, build the macro.
pub fn macro_from_str(source: &str, config: &Config) -> Result<Vec<MacroEvent>, BuildError> {
    let records = midicsv::parse(source);
    let records = fit_to_window(records, config.window_min, config.window_max);
    let tempo = TempoMap::from_records(&records)?;
    let layout = KeyLayout::new(config.key_rows);
    Ok(build_macro(&records, &tempo, &layout, config))
}

pub fn macro_from_path(path: &Path, config: &Config) -> Result<Vec<MacroEvent>, BuildError> {
    let records = midicsv::load(path)?;
    let records = fit_to_window(records, config.window_min, config.window_max);
    let tempo = TempoMap::from_records(&records)?;
    let layout = KeyLayout::new(config.key_rows);
    Ok(build_macro(&records, &tempo, &layout, config))
}
