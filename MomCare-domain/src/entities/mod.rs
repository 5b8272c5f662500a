// Domain entities and value objects
pub mod alert;
pub mod conversions;
pub mod message;
pub mod pregnancy;
pub mod user;
pub mod vital;

use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

// Re-export common types for easier imports
pub use alert::Alert;
pub use message::Message;
pub use pregnancy::{Pregnancy, PregnancyDetails, RiskFactor};
pub use user::User;
pub use vital::Vital;

/// Closed set of lower-level string values shared by storage and the wire format
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "with-api", derive(ToSchema))]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Wire and storage representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!("Invalid {}: {}", stringify!($name), other)),
                }
            }
        }
    };
}

string_enum! {
    /// Account role
    Role {
        Patient => "patient",
        Provider => "provider",
    }
}

string_enum! {
    /// Tracking mode of a patient
    Mode {
        Fertility => "fertility",
        Pregnancy => "pregnancy",
    }
}

string_enum! {
    /// ABO/Rh blood group
    BloodType {
        APositive => "A+",
        ANegative => "A-",
        BPositive => "B+",
        BNegative => "B-",
        AbPositive => "AB+",
        AbNegative => "AB-",
        OPositive => "O+",
        ONegative => "O-",
    }
}

string_enum! {
    /// Kind of logged vital
    VitalType {
        /// Blood pressure; value is systolic, secondary value diastolic
        Bp => "bp",
        Weight => "weight",
        BloodSugar => "bloodSugar",
        Temperature => "temperature",
        /// Kick count over a session of `secondary_value` minutes
        FetalMovement => "fetalMovement",
        /// Duration in seconds with intensity 1-10
        Contraction => "contraction",
    }
}

impl VitalType {
    /// Unit stored when the client does not provide one
    pub fn default_unit(&self) -> &'static str {
        match self {
            VitalType::Bp => "mmHg",
            VitalType::Weight => "kg",
            VitalType::BloodSugar => "mg/dL",
            VitalType::Temperature => "°C",
            VitalType::FetalMovement => "kicks",
            VitalType::Contraction => "s",
        }
    }

    /// Human readable label used in provider views
    pub fn label(&self) -> &'static str {
        match self {
            VitalType::Bp => "BP Reading",
            VitalType::Weight => "Weight",
            VitalType::BloodSugar => "Blood Sugar",
            VitalType::Temperature => "Temperature",
            VitalType::FetalMovement => "Kick Count",
            VitalType::Contraction => "Contraction",
        }
    }
}

string_enum! {
    /// Alert urgency
    AlertType {
        Critical => "critical",
        Warning => "warning",
        Info => "info",
    }
}

string_enum! {
    /// Pregnancy risk classification
    RiskLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl RiskLevel {
    /// Level for a 0-100 risk score
    pub fn from_score(score: u32) -> Self {
        if score > 60 {
            RiskLevel::High
        } else if score > 30 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

string_enum! {
    /// Severity of an individual risk factor
    Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}
