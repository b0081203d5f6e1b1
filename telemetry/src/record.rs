/*!
Telemetry records: one decoded sample per channel per pass, rendered as the
short ASCII line the downstream display expects.
*/

use std::fmt;

/// Decoded value of one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodedValue {
    /// Scaled physical value of a word channel, rendered with three decimals
    Numeric(f64),
    /// Single bit of a flag channel: 0 or 1, or 0 or -1 when sign-inverted
    Flag(i8),
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{:.3}", value),
            Self::Flag(bit) => write!(f, "{}", bit),
        }
    }
}

/// External point id plus decoded value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord {
    pub point_id: u32,
    pub value: DecodedValue,
}

impl TelemetryRecord {
    pub fn new(point_id: u32, value: DecodedValue) -> Self {
        Self { point_id, value }
    }

    /// Wire form of the record: `"<pointId>,<value>\n"`
    pub fn to_datagram(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.point_id, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_record_has_three_decimals() {
        let record = TelemetryRecord::new(179, DecodedValue::Numeric(4096.0));
        assert_eq!(record.to_string(), "179,4096.000");

        let record = TelemetryRecord::new(221, DecodedValue::Numeric(-273.15));
        assert_eq!(record.to_string(), "221,-273.150");

        let record = TelemetryRecord::new(6, DecodedValue::Numeric(1.2345678));
        assert_eq!(record.to_string(), "6,1.235");
    }

    #[test]
    fn test_flag_record_is_bare_integer() {
        assert_eq!(TelemetryRecord::new(157, DecodedValue::Flag(1)).to_string(), "157,1");
        assert_eq!(TelemetryRecord::new(157, DecodedValue::Flag(0)).to_string(), "157,0");
        assert_eq!(TelemetryRecord::new(157, DecodedValue::Flag(-1)).to_string(), "157,-1");
    }

    #[test]
    fn test_datagram_is_newline_terminated() {
        let record = TelemetryRecord::new(100, DecodedValue::Numeric(1.5));
        assert_eq!(record.to_datagram(), "100,1.500\n");
    }
}
