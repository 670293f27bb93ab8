use crate::model::Family;

/// Fixed event-code -> description table. Unrecognized codes return the
/// `"Unknown event"` sentinel rather than an error; a malformed event
/// stream is a recoverable anomaly, not a fatal one.
const EVENTS: &[(u8, &str)] = &[
    (0xA8, "Entered PDI mode"),
    (0xA9, "Exited PDI mode"),
    (0xAB, "Deco ceiling lowered"),
    (0xAD, "Deco ceiling raised"),
    (0xBD, "Switched to normal PO2 setting"),
    (0xC0, "Switched to FO2 21% mode"),
    (0xC1, "Ascent rate greater than limit"),
    (0xC2, "Low battery warning"),
    (0xC3, "CNS Oxygen toxicity warning"),
    (0xC4, "Depth exceeds user set point"),
    (0xC5, "Entered decompression mode"),
    (0xC7, "Entered Gauge mode"),
    (0xC8, "PO2 too high"),
    (0xCC, "Low Cylinder 1 pressure"),
    (0xCD, "Switched to deco blend"),
    (0xCE, "Non-decompression warning"),
    (0xD0, "Breathing rate alarm"),
    (0xD3, "Low gas 1 flow rate"),
    (0xD6, "Depth is less than ceiling"),
    (0xD8, "End decompression mode"),
    (0xE1, "End ascent rate warning"),
    (0xE2, "Low SBAT battery warning"),
    (0xE3, "Switched to FO2 mode"),
    (0xE5, "Switched to PO2 mode"),
    (0xEE, "End non-decompression warning"),
    (0xEF, "Switch to blend 2"),
    (0xF0, "Breathing rate alarm"),
    (0xF3, "Switch to blend 1"),
    (0xF6, "End Depth is less than ceiling"),
];

pub const UNKNOWN_EVENT: &str = "Unknown event";

pub fn describe_event(code: u8) -> &'static str {
    EVENTS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, desc)| *desc)
        .unwrap_or(UNKNOWN_EVENT)
}

/// Total inter-dive record length (including the code byte) for a given
/// family and code. Returns `None` for a code not in the family's table,
/// which the profile parser treats as the end of the inter-dive preamble
/// rather than an error.
pub fn inter_dive_record_len(family: Family, code: u8) -> Option<usize> {
    let table: &[(u8, usize)] = match family {
        Family::CommanderII | Family::CommanderIII => &[
            (0x00, 16),
            (0x01, 20),
            (0x02, 17),
            (0x03, 16),
            (0x06, 18),
            (0x07, 18),
            (0x08, 18),
            (0x09, 18),
            (0x0A, 18),
            (0x0B, 18),
            (0x0C, 18),
            (0x0D, 18),
            (0x0E, 18),
            (0x10, 20),
        ],
        Family::Gemini => &[
            (0x00, 10),
            (0x02, 17),
            (0x06, 18),
            (0x07, 18),
            (0x0A, 18),
            (0x0B, 18),
            (0x0F, 18),
            (0x10, 18),
        ],
        Family::Emc => &[
            (0x00, 18),
            (0x01, 22),
            (0x02, 19),
            (0x03, 18),
            (0x06, 20),
            (0x07, 20),
            (0x0A, 20),
            (0x0B, 20),
            (0x0F, 18),
            (0x10, 20),
        ],
        Family::CommanderI | Family::Nemesis => &[],
    };
    table.iter().find(|(c, _)| *c == code).map(|(_, len)| *len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_code_falls_back() {
        assert_eq!(describe_event(0x00), UNKNOWN_EVENT);
        assert_eq!(describe_event(0xC8), "PO2 too high");
    }

    #[test]
    fn commander_i_has_no_inter_dive_table() {
        assert_eq!(inter_dive_record_len(Family::CommanderI, 0x00), None);
    }

    #[test]
    fn gemini_table_differs_from_commander() {
        assert_eq!(inter_dive_record_len(Family::Gemini, 0x00), Some(10));
        assert_eq!(inter_dive_record_len(Family::CommanderII, 0x00), Some(16));
    }
}
