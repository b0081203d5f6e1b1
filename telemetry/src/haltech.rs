/*!
Haltech CAN protocol v2 broadcast frames.

The identifiers the ECU broadcasts and the channels the gateway republishes
from them. Both tables are fixed at build time.
*/

use crate::channel::{ChannelSpec, DecodeTable};
use crate::error::Result;
use crate::tracked::TrackedIds;

/// Identifiers tracked in the process image
#[rustfmt::skip]
pub const TRACKED_IDS: [u32; 24] = [
    0x360, 0x361, 0x362, 0x363,
    0x368, 0x369, 0x36A, 0x36B, 0x36C, 0x36D, 0x36E, 0x36F,
    0x370, 0x371, 0x372, 0x373, 0x374, 0x375,
    0x3E0, 0x3E1, 0x3E2, 0x3E3, 0x3E4,
    0x470,
];

/// Channels in transmission order
pub const CHANNELS: [ChannelSpec; 19] = [
    ChannelSpec::word("RPM", 0x360, (0, 1), 1.0, 0.0, Some("RPM"), 179),
    ChannelSpec::word("Manifold Pressure", 0x360, (2, 3), 0.1, 0.0, Some("kPA"), 155),
    ChannelSpec::word("Throttle Position", 0x360, (4, 5), 0.1, 0.0, Some("%"), 202),
    ChannelSpec::word("Battery", 0x372, (0, 1), 0.1, 0.0, Some("V"), 228),
    ChannelSpec::word("Coolant Pressure", 0x360, (6, 7), 0.1, 101.3, Some("kPA"), 29),
    ChannelSpec::word("Fuel Pressure", 0x361, (0, 1), 0.1, 101.3, Some("kPA"), 100),
    ChannelSpec::word("Oil Pressure", 0x361, (2, 3), 0.1, 101.3, Some("kPA"), 169),
    ChannelSpec::word("STG 1 DUTY", 0x362, (0, 1), 0.1, 0.0, Some("%"), 133),
    ChannelSpec::word("STG 2 DUTY", 0x362, (2, 3), 0.1, 0.0, Some("%"), 275),
    ChannelSpec::word("Target Boost", 0x372, (4, 5), 0.1, 0.0, Some("%"), 22),
    ChannelSpec::word("Lambda 1", 0x368, (0, 1), 0.001, 0.0, Some("λ"), 6),
    ChannelSpec::word("Fuel Composition", 0x3E1, (4, 5), 0.1, 0.0, Some("%"), 84),
    ChannelSpec::word("Vehicle Speed", 0x370, (0, 1), 0.1, 0.0, Some("km/h"), 199),
    ChannelSpec::word("Coolant Temperature", 0x3E0, (0, 1), 0.1, 273.15, Some("C"), 221),
    ChannelSpec::word("Air Temperature", 0x3E0, (2, 3), 0.1, 273.15, Some("C"), 135),
    ChannelSpec::flag("MIL", 0x3E4, (7, 0), 1.0, 157),
    ChannelSpec::word("Fuel Temperature", 0x3E0, (4, 5), 0.1, 273.15, Some("C"), 101),
    ChannelSpec::word("Knock Level", 0x36A, (0, 1), 0.01, 0.0, Some("dB"), 137),
    ChannelSpec::word("GEAR POS", 0x470, (2, 3), 1.0, 0.0, None, 106),
];

/// Tracked-ID index over [`TRACKED_IDS`]
pub fn tracked_ids() -> TrackedIds {
    TrackedIds::new(TRACKED_IDS)
}

/// [`CHANNELS`] bound to the slots of `tracked`
pub fn decode_table(tracked: &TrackedIds) -> Result<DecodeTable> {
    DecodeTable::new(&CHANNELS, tracked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Encoding;
    use crate::image::ProcessImage;
    use std::collections::HashSet;

    #[test]
    fn test_tracked_ids_are_sorted_and_unique() {
        assert!(TRACKED_IDS.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(tracked_ids().len(), TRACKED_IDS.len());
    }

    #[test]
    fn test_every_channel_binds() {
        let tracked = tracked_ids();
        let table = decode_table(&tracked).unwrap();
        assert_eq!(table.len(), CHANNELS.len());

        for (bound, spec) in table.iter().zip(CHANNELS.iter()) {
            assert_eq!(tracked.slot_of(spec.can_id), Some(bound.slot));
        }
    }

    #[test]
    fn test_point_ids_are_unique() {
        let ids: HashSet<u32> = CHANNELS.iter().map(|c| c.point_id).collect();
        assert_eq!(ids.len(), CHANNELS.len());
    }

    #[test]
    fn test_only_mil_is_a_flag() {
        let flags: Vec<_> = CHANNELS
            .iter()
            .filter(|c| matches!(c.encoding, Encoding::Flag { .. }))
            .map(|c| c.label)
            .collect();
        assert_eq!(flags, vec!["MIL"]);
    }

    #[test]
    fn test_blank_image_decodes_to_negated_offsets() {
        let tracked = tracked_ids();
        let table = decode_table(&tracked).unwrap();
        let image = ProcessImage::for_tracked(&tracked);

        let lines: Vec<String> = table
            .iter()
            .map(|channel| channel.sample(&image).unwrap().record.to_string())
            .collect();

        assert_eq!(lines[0], "179,0.000");
        assert_eq!(lines[4], "29,-101.300");
        assert_eq!(lines[13], "221,-273.150");
        assert_eq!(lines[15], "157,0");
    }

    #[test]
    fn test_labels_and_units_match_ecu_naming() {
        let labelled: Vec<_> = CHANNELS.iter().map(|c| (c.point_id, c.label, c.unit)).collect();
        assert!(labelled.contains(&(155, "Manifold Pressure", Some("kPA"))));
        assert!(labelled.contains(&(169, "Oil Pressure", Some("kPA"))));
        assert!(labelled.contains(&(133, "STG 1 DUTY", Some("%"))));
        assert!(labelled.contains(&(275, "STG 2 DUTY", Some("%"))));
        assert!(labelled.contains(&(106, "GEAR POS", None)));
    }

    #[test]
    fn test_channel_table_serializes() {
        let json = serde_json::to_value(CHANNELS[15]).unwrap();
        assert_eq!(json["label"], "MIL");
        assert_eq!(json["encoding"]["kind"], "flag");
        assert_eq!(json["encoding"]["byte"], 7);
        assert_eq!(json["point_id"], 157);
    }
}
