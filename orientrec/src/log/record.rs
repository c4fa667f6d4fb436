//! One line of an orientation log.
//!
//! ```text
//! <offset_ms>,O,<heading>,<pitch>,<roll>
//! <offset_ms>,L,<latitude>,<longitude>,<altitude>,<bearing>,<speed>,<accuracy>
//! <offset_ms>,A,<true|false>
//! ```

use std::fmt::{self, Display};
use std::str::FromStr;

use thiserror::Error;

use crate::orientation::{ChangeKind, Location, OrientationReader};

/// Errors from parsing a log line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogParseError {
    /// The line has no fields at all.
    #[error("Empty line")]
    Empty,

    /// The offset is not a non-negative integer.
    #[error("Invalid offset '{0}'")]
    InvalidOffset(String),

    /// The kind tag is not `O`, `L` or `A`.
    #[error("Unknown event kind '{0}'")]
    UnknownKind(String),

    /// The line ends before a required field.
    #[error("Missing field '{field}' for {kind} event")]
    MissingField {
        kind: ChangeKind,
        field: &'static str,
    },

    /// A numeric field could not be parsed.
    #[error("Invalid number '{value}' for field '{field}'")]
    InvalidNumber { field: &'static str, value: String },

    /// A boolean field is neither `true` nor `false`.
    #[error("Invalid boolean '{0}'")]
    InvalidBool(String),
}

/// Payload of a log line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogEvent {
    Orientation { heading: f32, pitch: f32, roll: f32 },
    Location(Location),
    Accuracy { has_interference: bool },
}

impl LogEvent {
    /// The notification kind this event replays as.
    pub fn kind(&self) -> ChangeKind {
        match self {
            LogEvent::Orientation { .. } => ChangeKind::Orientation,
            LogEvent::Location(_) => ChangeKind::Location,
            LogEvent::Accuracy { .. } => ChangeKind::Accuracy,
        }
    }

    /// Capture the current values of a source for a change of `kind`.
    ///
    /// Returns `None` for a location change on a source without a location.
    pub fn capture(kind: ChangeKind, source: &dyn OrientationReader) -> Option<Self> {
        match kind {
            ChangeKind::Orientation => Some(LogEvent::Orientation {
                heading: source.heading(),
                pitch: source.pitch(),
                roll: source.roll(),
            }),
            ChangeKind::Location => source.location().map(LogEvent::Location),
            ChangeKind::Accuracy => Some(LogEvent::Accuracy {
                has_interference: source.has_interference(),
            }),
        }
    }
}

/// A timestamped log line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord {
    /// Milliseconds since the start of the recording.
    pub offset_ms: u64,
    pub event: LogEvent,
}

impl LogRecord {
    pub fn new(offset_ms: u64, event: LogEvent) -> Self {
        Self { offset_ms, event }
    }

    pub fn kind(&self) -> ChangeKind {
        self.event.kind()
    }
}

/// Shortest round-trip decimal, with a fractional part for integral values.
struct Decimal<T>(T);

macro_rules! impl_decimal {
    ($($t:ty),*) => {$(
        impl Display for Decimal<$t> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let value = self.0;
                if value.is_finite() && value.fract() == 0.0 {
                    write!(f, "{}.0", value)
                } else {
                    write!(f, "{}", value)
                }
            }
        }
    )*};
}

impl_decimal!(f32, f64);

impl Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.offset_ms, self.kind().tag())?;
        match &self.event {
            LogEvent::Orientation {
                heading,
                pitch,
                roll,
            } => write!(
                f,
                ",{},{},{}",
                Decimal(*heading),
                Decimal(*pitch),
                Decimal(*roll)
            ),
            LogEvent::Location(location) => write!(
                f,
                ",{},{},{},{},{},{}",
                Decimal(location.latitude),
                Decimal(location.longitude),
                Decimal(location.altitude),
                Decimal(location.bearing),
                Decimal(location.speed),
                Decimal(location.accuracy)
            ),
            LogEvent::Accuracy { has_interference } => write!(f, ",{}", has_interference),
        }
    }
}

/// Cursor over the comma-separated fields of one line.
struct Fields<'a> {
    kind: ChangeKind,
    parts: std::str::Split<'a, char>,
}

impl<'a> Fields<'a> {
    fn next(&mut self, field: &'static str) -> Result<&'a str, LogParseError> {
        self.parts
            .next()
            .map(str::trim)
            .ok_or(LogParseError::MissingField {
                kind: self.kind,
                field,
            })
    }

    fn number<T: FromStr>(&mut self, field: &'static str) -> Result<T, LogParseError> {
        let value = self.next(field)?;
        value.parse().map_err(|_| LogParseError::InvalidNumber {
            field,
            value: value.to_string(),
        })
    }

    fn boolean(&mut self, field: &'static str) -> Result<bool, LogParseError> {
        let value = self.next(field)?;
        if value.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if value.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(LogParseError::InvalidBool(value.to_string()))
        }
    }
}

impl FromStr for LogRecord {
    type Err = LogParseError;

    /// Parse one line. Trailing `\r` and extra fields are ignored.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(LogParseError::Empty);
        }

        let mut parts = line.split(',');
        let offset = parts.next().map(str::trim).unwrap_or_default();
        let offset_ms: u64 = offset
            .parse()
            .map_err(|_| LogParseError::InvalidOffset(offset.to_string()))?;

        let tag = parts.next().map(str::trim).unwrap_or_default();
        let kind = match tag {
            "O" => ChangeKind::Orientation,
            "L" => ChangeKind::Location,
            "A" => ChangeKind::Accuracy,
            other => return Err(LogParseError::UnknownKind(other.to_string())),
        };

        let mut fields = Fields { kind, parts };
        let event = match kind {
            ChangeKind::Orientation => LogEvent::Orientation {
                heading: fields.number("heading")?,
                pitch: fields.number("pitch")?,
                roll: fields.number("roll")?,
            },
            ChangeKind::Location => {
                let latitude = fields.number("latitude")?;
                let longitude = fields.number("longitude")?;
                let altitude = fields.number("altitude")?;
                let bearing = fields.number("bearing")?;
                let speed = fields.number("speed")?;
                let accuracy = fields.number("accuracy")?;
                LogEvent::Location(
                    Location::new(latitude, longitude, altitude).with_motion(
                        bearing, speed, accuracy,
                    ),
                )
            }
            ChangeKind::Accuracy => LogEvent::Accuracy {
                has_interference: fields.boolean("has_interference")?,
            },
        };

        Ok(LogRecord { offset_ms, event })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_orientation() {
        let record = LogRecord::new(
            0,
            LogEvent::Orientation {
                heading: 10.0,
                pitch: 5.0,
                roll: 1.0,
            },
        );
        assert_eq!(record.to_string(), "0,O,10.0,5.0,1.0");
    }

    #[test]
    fn test_write_fractional_values() {
        let record = LogRecord::new(
            1234,
            LogEvent::Orientation {
                heading: 359.5,
                pitch: -12.25,
                roll: 0.1,
            },
        );
        assert_eq!(record.to_string(), "1234,O,359.5,-12.25,0.1");
    }

    #[test]
    fn test_write_location() {
        let location = Location::new(47.6062, -122.3321, 56.0).with_motion(270.0, 1.5, 4.0);
        let record = LogRecord::new(20, LogEvent::Location(location));
        assert_eq!(
            record.to_string(),
            "20,L,47.6062,-122.3321,56.0,270.0,1.5,4.0"
        );
    }

    #[test]
    fn test_write_accuracy() {
        let record = LogRecord::new(
            500,
            LogEvent::Accuracy {
                has_interference: true,
            },
        );
        assert_eq!(record.to_string(), "500,A,true");
    }

    #[test]
    fn test_parse_orientation() {
        let record: LogRecord = "0,O,10.0,5.0,1.0".parse().unwrap();
        assert_eq!(record.offset_ms, 0);
        assert_eq!(
            record.event,
            LogEvent::Orientation {
                heading: 10.0,
                pitch: 5.0,
                roll: 1.0
            }
        );
    }

    #[test]
    fn test_parse_location_has_no_time() {
        let record: LogRecord = "20,L,47.6062,-122.3321,56.0,270.0,1.5,4.0".parse().unwrap();
        match record.event {
            LogEvent::Location(location) => {
                assert_eq!(location.latitude, 47.6062);
                assert_eq!(location.longitude, -122.3321);
                assert_eq!(location.speed, 1.5);
                assert!(location.time.is_none());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_parse_accepts_exponents_and_crlf() {
        let record: LogRecord = "7,O,1.0E-5,2.5e1,0\r".parse().unwrap();
        assert_eq!(
            record.event,
            LogEvent::Orientation {
                heading: 1.0e-5,
                pitch: 25.0,
                roll: 0.0
            }
        );
    }

    #[test]
    fn test_parse_boolean_case_insensitive() {
        let record: LogRecord = "1,A,TRUE".parse().unwrap();
        assert_eq!(
            record.event,
            LogEvent::Accuracy {
                has_interference: true
            }
        );
        let record: LogRecord = "1,A,False".parse().unwrap();
        assert_eq!(
            record.event,
            LogEvent::Accuracy {
                has_interference: false
            }
        );
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let record: LogRecord = "3,A,false,extra,fields".parse().unwrap();
        assert_eq!(record.offset_ms, 3);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<LogRecord>(), Err(LogParseError::Empty));
        assert_eq!("   ".parse::<LogRecord>(), Err(LogParseError::Empty));
        assert_eq!(
            "abc,O,1,2,3".parse::<LogRecord>(),
            Err(LogParseError::InvalidOffset("abc".into()))
        );
        assert_eq!(
            "-5,O,1,2,3".parse::<LogRecord>(),
            Err(LogParseError::InvalidOffset("-5".into()))
        );
        assert_eq!(
            "0,X,1".parse::<LogRecord>(),
            Err(LogParseError::UnknownKind("X".into()))
        );
        assert_eq!(
            "0".parse::<LogRecord>(),
            Err(LogParseError::UnknownKind(String::new()))
        );
        assert_eq!(
            "0,O,1.0,2.0".parse::<LogRecord>(),
            Err(LogParseError::MissingField {
                kind: ChangeKind::Orientation,
                field: "roll"
            })
        );
        assert_eq!(
            "0,O,1.0,north,2.0".parse::<LogRecord>(),
            Err(LogParseError::InvalidNumber {
                field: "pitch",
                value: "north".into()
            })
        );
        assert_eq!(
            "0,A,yes".parse::<LogRecord>(),
            Err(LogParseError::InvalidBool("yes".into()))
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_orientation_line_preserves_values(
                offset in 0u64..10_000_000,
                heading in 0.0f32..360.0,
                pitch in -90.0f32..90.0,
                roll in -180.0f32..180.0,
            ) {
                let record = LogRecord::new(offset, LogEvent::Orientation { heading, pitch, roll });
                let parsed: LogRecord = record.to_string().parse().unwrap();
                prop_assert_eq!(parsed, record);
            }

            #[test]
            fn test_location_line_preserves_values(
                latitude in -90.0f64..90.0,
                longitude in -180.0f64..180.0,
                altitude in -500.0f64..9000.0,
                bearing in 0.0f32..360.0,
                speed in 0.0f32..100.0,
                accuracy in 0.0f32..500.0,
            ) {
                let location = Location::new(latitude, longitude, altitude)
                    .with_motion(bearing, speed, accuracy);
                let record = LogRecord::new(42, LogEvent::Location(location));
                let parsed: LogRecord = record.to_string().parse().unwrap();
                prop_assert_eq!(parsed, record);
            }
        }
    }
}
