use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One cube test result.
///
/// `mark_prefix + mark_number + mark_suffix` reconstructs the full cube mark
/// as it appeared in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeRecord {
    pub mark_prefix: String,
    pub mark_number: String,
    pub mark_suffix: String,
    pub report_number: String,
    pub date_cast: String,
    pub pour_location: String,
    /// Compressive strength in MPa, as printed in the report.
    pub compressive_strength: String,
}

impl CubeRecord {
    pub fn full_mark(&self) -> String {
        format!("{}{}{}", self.mark_prefix, self.mark_number, self.mark_suffix)
    }

    pub fn field(&self, field: RecordField) -> &str {
        match field {
            RecordField::MarkPrefix => &self.mark_prefix,
            RecordField::MarkNumber => &self.mark_number,
            RecordField::MarkSuffix => &self.mark_suffix,
            RecordField::ReportNumber => &self.report_number,
            RecordField::DateCast => &self.date_cast,
            RecordField::CompressiveStrength => &self.compressive_strength,
            RecordField::PourLocation => &self.pour_location,
        }
    }

    pub fn concrete_type(&self) -> ConcreteType {
        ConcreteType::classify(&self.mark_prefix)
    }
}

/// Record columns in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    MarkPrefix,
    MarkNumber,
    MarkSuffix,
    ReportNumber,
    DateCast,
    CompressiveStrength,
    PourLocation,
}

impl RecordField {
    pub const ALL: [RecordField; 7] = [
        RecordField::MarkPrefix,
        RecordField::MarkNumber,
        RecordField::MarkSuffix,
        RecordField::ReportNumber,
        RecordField::DateCast,
        RecordField::CompressiveStrength,
        RecordField::PourLocation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RecordField::MarkPrefix => "mark_prefix",
            RecordField::MarkNumber => "mark_number",
            RecordField::MarkSuffix => "mark_suffix",
            RecordField::ReportNumber => "report_number",
            RecordField::DateCast => "date_cast",
            RecordField::CompressiveStrength => "compressive_strength",
            RecordField::PourLocation => "pour_location",
        }
    }

    /// A record missing a critical field cannot be placed in the output.
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            RecordField::MarkPrefix
                | RecordField::MarkNumber
                | RecordField::MarkSuffix
                | RecordField::CompressiveStrength
        )
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Concrete grade and waterproofing, derived from the mark prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConcreteType {
    #[serde(rename = "45D")]
    Grade45,
    #[serde(rename = "60D")]
    Grade60,
    #[serde(rename = "45DWP")]
    Grade45Wp,
    #[serde(rename = "60DWP")]
    Grade60Wp,
    Unknown,
}

impl ConcreteType {
    /// Classify a mark prefix by substring containment.
    ///
    /// Waterproof combinations are checked before the bare grades. A prefix
    /// containing both grade markers resolves to 45D.
    pub fn classify(mark_prefix: &str) -> ConcreteType {
        let mark = mark_prefix.to_uppercase();
        let is45 = mark.contains("45D");
        let is60 = mark.contains("60D");
        let is_wp = mark.contains("WP");

        if is45 && is_wp {
            ConcreteType::Grade45Wp
        } else if is60 && is_wp {
            ConcreteType::Grade60Wp
        } else if is45 {
            ConcreteType::Grade45
        } else if is60 {
            ConcreteType::Grade60
        } else {
            ConcreteType::Unknown
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ConcreteType::Grade45 => "45D",
            ConcreteType::Grade60 => "60D",
            ConcreteType::Grade45Wp => "45DWP",
            ConcreteType::Grade60Wp => "60DWP",
            ConcreteType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ConcreteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConcreteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "45D" => Ok(ConcreteType::Grade45),
            "60D" => Ok(ConcreteType::Grade60),
            "45DWP" => Ok(ConcreteType::Grade45Wp),
            "60DWP" => Ok(ConcreteType::Grade60Wp),
            "UNKNOWN" => Ok(ConcreteType::Unknown),
            other => Err(format!(
                "unknown concrete type '{other}' (expected 45D, 60D, 45DWP, 60DWP or Unknown)"
            )),
        }
    }
}

/// Page-scoped report fields. Empty when the report does not carry them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub report_number: String,
    pub date_cast: String,
    pub pour_location: String,
}
