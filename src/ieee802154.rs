//! Command and response tables for an IEEE 802.15.4 radio module in API mode.

use crate::schema::{CommandSpec, FieldSpec, Registry, ResponseSpec};

pub static IEEE802154: Registry = Registry {
    commands: &[
        CommandSpec {
            name: "tx_long_addr",
            fields: &[
                FieldSpec::fixed("id", 1).with_default(&[0x00]),
                FieldSpec::fixed("frame_id", 1).with_default(&[0x00]),
                FieldSpec::fixed("dest_addr", 8),
                FieldSpec::fixed("options", 1).with_default(&[0x00]),
                FieldSpec::to_end("data"),
            ],
        },
        CommandSpec {
            name: "tx",
            fields: &[
                FieldSpec::fixed("id", 1).with_default(&[0x01]),
                FieldSpec::fixed("frame_id", 1).with_default(&[0x00]),
                FieldSpec::fixed("dest_addr", 2),
                FieldSpec::fixed("options", 1).with_default(&[0x00]),
                FieldSpec::to_end("data"),
            ],
        },
    ],
    responses: &[
        ResponseSpec {
            id: 0x80,
            name: "rx_long_addr",
            fields: &[
                FieldSpec::fixed("source_addr", 8),
                FieldSpec::fixed("rssi", 1),
                FieldSpec::fixed("options", 1),
                FieldSpec::to_end("rf_data"),
            ],
            transforms: &[],
        },
        ResponseSpec {
            id: 0x81,
            name: "rx",
            fields: &[
                FieldSpec::fixed("source_addr", 2),
                FieldSpec::fixed("rssi", 1),
                FieldSpec::fixed("options", 1),
                FieldSpec::to_end("rf_data"),
            ],
            transforms: &[],
        },
        ResponseSpec {
            id: 0x89,
            name: "tx_status",
            fields: &[FieldSpec::fixed("frame_id", 1), FieldSpec::fixed("status", 1)],
            transforms: &[],
        },
        ResponseSpec {
            id: 0x8A,
            name: "status",
            fields: &[FieldSpec::fixed("status", 1)],
            transforms: &[],
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_consistent() {
        assert_eq!(IEEE802154.validate(), Ok(()));
    }

    #[test]
    fn command_ids() {
        assert_eq!(IEEE802154.command("tx_long_addr").and_then(|c| c.id()), Some(0x00));
        assert_eq!(IEEE802154.command_with_id(0x01).map(|c| c.name), Some("tx"));
        assert!(IEEE802154.command_with_id(0x89).is_none());
    }
}
