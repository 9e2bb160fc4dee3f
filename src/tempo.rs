use crate::error::BuildError;
use crate::midicsv::{EventKind, Record};

/// An interval of ticks with a constant microseconds-per-tick rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoSegment {
    pub start_tick: i64,
    pub us_per_tick: f64,
}

/// Piecewise tempo schedule covering `[0, ∞)`.
///
/// Segments are sorted ascending by start tick. If the file carries no
/// tempo record at tick 0, the MIDI default of 500000 µs per quarter note
/// is synthesized there.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    pub division: u32,
    segments: Vec<TempoSegment>,
}

const DEFAULT_US_PER_QUARTER: u32 = 500_000;

impl TempoMap {
    /// Build the schedule from parsed records. Fatal if no Header record
    /// supplies the ticks-per-quarter division; there is no per-event
    /// recovery from a missing time basis.
    pub fn from_records(records: &[Record]) -> Result<Self, BuildError> {
        let mut division = None;
        let mut tempos: Vec<(i64, u32)> = Vec::new();

        for record in records {
            let Record::Data { tick, event, .. } = record else {
                continue;
            };
            match event {
                EventKind::Header { division: d } => division = Some(*d),
                EventKind::Tempo { us_per_quarter } => tempos.push((*tick, *us_per_quarter)),
                _ => {}
            }
        }

        let division = division.ok_or(BuildError::MissingDivision)?;

        if tempos.is_empty() {
            tempos.push((0, DEFAULT_US_PER_QUARTER));
        }
        tempos.sort_by_key(|&(tick, _)| tick);

        let segments = tempos
            .into_iter()
            .map(|(start_tick, us_per_quarter)| TempoSegment {
                start_tick,
                us_per_tick: us_per_quarter as f64 / division as f64,
            })
            .collect();

        Ok(Self { division, segments })
    }

    pub fn segments(&self) -> &[TempoSegment] {
        &self.segments
    }

    /// Elapsed real time at `tick`, in seconds.
    ///
    /// Walks segments in ascending order, accumulating the overlap of each
    /// segment with `[0, tick]` at that segment's rate. All arithmetic is
    /// floating-point; nothing is rounded before the final result.
    pub fn ticks_to_seconds(&self, tick: i64) -> f64 {
        let mut elapsed_us = 0.0;

        for (i, segment) in self.segments.iter().enumerate() {
            if tick <= segment.start_tick {
                break;
            }

            let segment_end = match self.segments.get(i + 1) {
                Some(next) => next.start_tick.min(tick),
                None => tick,
            };
            let delta_ticks = (segment_end - segment.start_tick).max(0);
            elapsed_us += delta_ticks as f64 * segment.us_per_tick;

            if segment_end == tick {
                break;
            }
        }

        elapsed_us / 1e6
    }
}
