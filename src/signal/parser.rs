//! Line grammar for the two-channel sample stream.
//!
//! ```text
//! line    := token (WS token)*
//! token   := marker WS value | other
//! marker  := "A0:" | "A1:"
//! value   := decimal floating point number
//! ```
//!
//! Tokens that are not markers are skipped so devices can append extra fields.
//! A line is accepted or rejected as a whole.
use std::fmt;
use std::str::FromStr;

use crate::signal::ScopeError;

/// Analog input a reading belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelTag {
    A0,
    A1,
}

impl ChannelTag {
    pub const ALL: [ChannelTag; 2] = [ChannelTag::A0, ChannelTag::A1];

    pub fn marker(self) -> &'static str {
        match self {
            ChannelTag::A0 => "A0:",
            ChannelTag::A1 => "A1:",
        }
    }

    pub fn from_marker(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.marker() == token)
    }

    /// Position of the channel in per-channel arrays.
    pub fn index(self) -> usize {
        match self {
            ChannelTag::A0 => 0,
            ChannelTag::A1 => 1,
        }
    }

    /// A1 closes a multi-channel reading and advances the shared x axis.
    pub fn finalizes_tick(self) -> bool {
        self == ChannelTag::A1
    }
}

impl fmt::Display for ChannelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelTag::A0 => f.write_str("A0"),
            ChannelTag::A1 => f.write_str("A1"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    pub channel: ChannelTag,
    pub value: f64,
}

enum ScanState {
    Seeking,
    ExpectValue(ChannelTag),
}

/// Stateless parser; every call starts from a clean scan state.
#[derive(Clone, Copy, Debug, Default)]
pub struct SampleLineParser;

impl SampleLineParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, line: &str) -> Result<Vec<Reading>, ScopeError> {
        let mut readings = Vec::with_capacity(ChannelTag::ALL.len());
        let mut state = ScanState::Seeking;
        for token in line.split_whitespace() {
            state = match state {
                ScanState::Seeking => match ChannelTag::from_marker(token) {
                    Some(tag) => ScanState::ExpectValue(tag),
                    None => ScanState::Seeking,
                },
                ScanState::ExpectValue(tag) => {
                    readings.push(Reading {
                        channel: tag,
                        value: parse_value(tag, token)?,
                    });
                    ScanState::Seeking
                }
            };
        }
        if let ScanState::ExpectValue(marker) = state {
            return Err(ScopeError::MissingValue { marker });
        }
        Ok(readings)
    }
}

fn parse_value(marker: ChannelTag, token: &str) -> Result<f64, ScopeError> {
    let invalid = || ScopeError::InvalidNumber {
        marker,
        token: token.to_owned(),
    };
    let value = f64::from_str(token).map_err(|_| invalid())?;
    // NaN or inf would poison every statistic for a full window.
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_channels_in_order() {
        let readings = SampleLineParser::new().parse("A0: 1.5 A1: -2.25").unwrap();
        assert_eq!(
            readings,
            vec![
                Reading { channel: ChannelTag::A0, value: 1.5 },
                Reading { channel: ChannelTag::A1, value: -2.25 },
            ]
        );
    }

    #[test]
    fn malformed_number_rejects_whole_line() {
        let err = SampleLineParser::new()
            .parse("A0: notanumber A1: 1.0")
            .unwrap_err();
        assert!(err.is_line_error());
        match err {
            ScopeError::InvalidNumber { marker, token } => {
                assert_eq!(marker, ChannelTag::A0);
                assert_eq!(token, "notanumber");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unknown_tokens_are_skipped() {
        let readings = SampleLineParser::new()
            .parse("t=1234 A0: 3 rssi -40 A1: 4e1 extra")
            .unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1].value, 40.0);
    }

    #[test]
    fn trailing_marker_is_missing_value() {
        let err = SampleLineParser::new().parse("A0: 1 A1:").unwrap_err();
        assert!(matches!(
            err,
            ScopeError::MissingValue { marker: ChannelTag::A1 }
        ));
    }

    #[test]
    fn marker_in_value_position_is_invalid() {
        let err = SampleLineParser::new().parse("A0: A1: 2").unwrap_err();
        assert!(matches!(err, ScopeError::InvalidNumber { .. }));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let parser = SampleLineParser::new();
        assert!(parser.parse("A0: NaN A1: 1").is_err());
        assert!(parser.parse("A0: 1 A1: inf").is_err());
    }

    #[test]
    fn empty_and_noise_lines_yield_nothing() {
        let parser = SampleLineParser::new();
        assert!(parser.parse("").unwrap().is_empty());
        assert!(parser.parse("booting firmware v2").unwrap().is_empty());
    }

    #[test]
    fn markers_round_trip() {
        for tag in ChannelTag::ALL {
            assert_eq!(ChannelTag::from_marker(tag.marker()), Some(tag));
        }
        assert_eq!(ChannelTag::from_marker("A2:"), None);
        assert!(ChannelTag::A1.finalizes_tick());
        assert!(!ChannelTag::A0.finalizes_tick());
    }
}
