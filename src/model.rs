use crate::error::{CochranError, Result};

/// Which container kind the caller is handing us. Not recoverable from the
/// bytes alone (the header offset depends on it), so it is supplied by the
/// caller, typically derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileVariant {
    Can,
    Wan,
    Ana,
}

/// A grouping of device models that share logbook layout, sample-unit size
/// and event conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    CommanderI,
    CommanderII,
    CommanderIII,
    Gemini,
    Nemesis,
    Emc,
}

impl Family {
    pub fn log_size(self) -> usize {
        match self {
            Family::CommanderI => 90,
            Family::CommanderII | Family::CommanderIII | Family::Gemini => 256,
            Family::Nemesis => 108,
            Family::Emc => 512,
        }
    }

    pub fn sample_unit(self) -> usize {
        match self {
            Family::CommanderI => 1,
            Family::Emc => 3,
            _ => 2,
        }
    }

    pub fn has_inter_dive_events(self) -> bool {
        !matches!(self, Family::CommanderI | Family::Nemesis)
    }
}

/// Model id -> family lookup. Deliberately a small explicit table rather
/// than a prefix match: models sharing a leading digit (e.g. "213" vs "215")
/// map to different families.
pub fn family_for_model(model: &[u8; 3]) -> Result<Family> {
    let name = std::str::from_utf8(model).unwrap_or("???");
    let family = match name {
        "017" | "120" | "124" | "140" => Family::CommanderI,
        "102" => Family::Gemini,
        "114" => Family::Nemesis,
        "213" => Family::CommanderII,
        "215" | "216" | "221" => Family::CommanderIII,
        "300" | "301" | "315" => Family::Emc,
        _ => return Err(CochranError::UnknownModel(*model)),
    };
    Ok(family)
}

/// Human-readable device name for a recognized model id, used by the
/// demonstration binary's summary output.
pub fn model_name(model: &[u8; 3]) -> &'static str {
    match std::str::from_utf8(model).unwrap_or("???") {
        "017" | "120" => "Early Commander",
        "124" => "Nemo",
        "140" => "AquaNox",
        "102" => "Early Gemini",
        "114" => "Nemesis",
        "213" => "Commander (pre-21000)",
        "215" | "216" => "Gemini",
        "221" => "Commander",
        "300" | "301" | "315" => "EMC",
        _ => "Unknown",
    }
}
