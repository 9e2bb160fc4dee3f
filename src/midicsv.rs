//! Parser for the line-oriented event lists produced by the external
//! MIDI-to-text converter.
//!
//! Format, one record per line:
//! `<track>, <tick>, <Type>, <arg>, <arg>, ...`
//!
//! Lines that are empty or start with `#` or `;` are comments. A line that
//! fails to parse as a data record is kept as a non-data line rather than
//! aborting the parse; the converter emits plenty of record types we never
//! interpret.

use std::fs;
use std::path::Path;

use crate::error::BuildError;

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Header { division: u32 },
    Tempo { us_per_quarter: u32 },
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8, velocity: u8 },
    Other { kind: String, args: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Comment, structural, or malformed line; raw text preserved.
    Blank(String),
    Data {
        track: u32,
        tick: i64,
        event: EventKind,
    },
}

impl Record {
    pub fn is_data(&self) -> bool {
        matches!(self, Record::Data { .. })
    }
}

/// Parse a whole event list. Never fails: anything unparseable becomes a
/// `Blank` record.
pub fn parse(source: &str) -> Vec<Record> {
    source.lines().map(parse_line).collect()
}

/// Read and parse a file.
pub fn load(path: &Path) -> Result<Vec<Record>, BuildError> {
    let text = fs::read_to_string(path).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&text))
}

fn parse_line(raw: &str) -> Record {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
        return Record::Blank(raw.to_string());
    }

    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return Record::Blank(raw.to_string());
    }

    let (Ok(track), Ok(tick)) = (parts[0].parse::<u32>(), parts[1].parse::<i64>()) else {
        return Record::Blank(raw.to_string());
    };

    let kind = parts[2];
    let args = &parts[3..];

    let event = match kind {
        "Header" => match args.get(2).and_then(|a| a.parse().ok()) {
            Some(division) => EventKind::Header { division },
            None => return Record::Blank(raw.to_string()),
        },
        "Tempo" => match args.first().and_then(|a| a.parse().ok()) {
            Some(us_per_quarter) => EventKind::Tempo { us_per_quarter },
            None => return Record::Blank(raw.to_string()),
        },
        "Note_on_c" | "Note_off_c" => {
            let note = parse_note_args(args);
            let Some((channel, pitch, velocity)) = note else {
                return Record::Blank(raw.to_string());
            };
            if kind == "Note_on_c" {
                EventKind::NoteOn {
                    channel,
                    pitch,
                    velocity,
                }
            } else {
                EventKind::NoteOff {
                    channel,
                    pitch,
                    velocity,
                }
            }
        }
        other => EventKind::Other {
            kind: other.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        },
    };

    Record::Data { track, tick, event }
}

fn parse_note_args(args: &[&str]) -> Option<(u8, u8, u8)> {
    let channel = args.first()?.parse().ok()?;
    let pitch: u8 = args.get(1)?.parse().ok()?;
    let velocity = args.get(2)?.parse().ok()?;
    if pitch > 127 {
        return None;
    }
    Some((channel, pitch, velocity))
}
