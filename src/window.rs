//! Global transpose of a piece into the instrument's playable window.

use crate::midicsv::{EventKind, Record};

/// Shift every note so the highest pitch in the piece lands exactly at
/// `window_max`, then drop any note that falls outside
/// `[window_min, window_max]`.
///
/// The offset is computed once from the global maximum and applied
/// uniformly, so note-on/note-off pairs stay aligned. Notes outside the
/// window after the shift are removed entirely, never clamped; only
/// interior-low notes can be lost when the original span exceeds the
/// window span. A list with no note records is returned unchanged.
pub fn fit_to_window(records: Vec<Record>, window_min: u8, window_max: u8) -> Vec<Record> {
    let max_pitch = records
        .iter()
        .filter_map(|r| note_pitch(r))
        .max();

    let Some(max_pitch) = max_pitch else {
        return records;
    };

    let offset = window_max as i32 - max_pitch as i32;

    records
        .into_iter()
        .filter_map(|record| shift_record(record, offset, window_min, window_max))
        .collect()
}

fn note_pitch(record: &Record) -> Option<u8> {
    match record {
        Record::Data {
            event: EventKind::NoteOn { pitch, .. } | EventKind::NoteOff { pitch, .. },
            ..
        } => Some(*pitch),
        _ => None,
    }
}

fn shift_record(record: Record, offset: i32, min: u8, max: u8) -> Option<Record> {
    let shifted = |pitch: u8| -> Option<u8> {
        let new_pitch = pitch as i32 + offset;
        (new_pitch >= min as i32 && new_pitch <= max as i32).then_some(new_pitch as u8)
    };

    match record {
        Record::Data { track, tick, event } => {
            let event = match event {
                EventKind::NoteOn {
                    channel,
                    pitch,
                    velocity,
                } => EventKind::NoteOn {
                    channel,
                    pitch: shifted(pitch)?,
                    velocity,
                },
                EventKind::NoteOff {
                    channel,
                    pitch,
                    velocity,
                } => EventKind::NoteOff {
                    channel,
                    pitch: shifted(pitch)?,
                    velocity,
                },
                other => other,
            };
            Some(Record::Data { track, tick, event })
        }
        blank => Some(blank),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midicsv::parse;

    fn pitches(records: &[Record]) -> Vec<u8> {
        records.iter().filter_map(note_pitch).collect()
    }

    #[test]
    fn highest_pitch_lands_on_window_max() {
        let records = parse(
            "1, 0, Note_on_c, 0, 90, 100\n1, 10, Note_on_c, 0, 70, 100\n1, 20, Note_on_c, 0, 55, 100",
        );
        let mapped = fit_to_window(records, 48, 83);
        let ps = pitches(&mapped);
        assert_eq!(ps.iter().max(), Some(&83));
        assert_eq!(ps, vec![83, 63, 48]);
    }

    #[test]
    fn out_of_window_notes_are_dropped_not_clamped() {
        // offset = 83 - 90 = -7; 40 -> 33 is below the window floor.
        let records = parse("1, 0, Note_on_c, 0, 40, 100\n1, 0, Note_on_c, 0, 90, 100");
        let mapped = fit_to_window(records, 48, 83);
        assert_eq!(pitches(&mapped), vec![83]);
    }

    #[test]
    fn note_off_shifts_identically_to_its_note_on() {
        let records = parse("1, 0, Note_on_c, 0, 90, 100\n1, 480, Note_off_c, 0, 90, 0");
        let mapped = fit_to_window(records, 48, 83);
        assert_eq!(pitches(&mapped), vec![83, 83]);
    }

    #[test]
    fn no_notes_is_a_no_op() {
        let records = parse("0, 0, Header, 1, 1, 480\n# comment");
        let mapped = fit_to_window(records.clone(), 48, 83);
        assert_eq!(mapped, records);
    }

    #[test]
    fn non_note_records_pass_through() {
        let records = parse("0, 0, Header, 1, 1, 480\n1, 0, Tempo, 500000\n1, 0, Note_on_c, 0, 90, 100");
        let mapped = fit_to_window(records, 48, 83);
        assert!(mapped.iter().any(|r| matches!(
            r,
            Record::Data { event: EventKind::Header { .. }, .. }
        )));
        assert!(mapped.iter().any(|r| matches!(
            r,
            Record::Data { event: EventKind::Tempo { .. }, .. }
        )));
    }
}
