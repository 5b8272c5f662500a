//! Clinical rules
//!
//! Pure functions over readings and dates. Nothing here touches storage,
//! so services can evaluate the rules and persist the outcome separately.

pub mod blood_pressure;
pub mod fertility;
pub mod gestation;
pub mod kicks;
pub mod labor;
pub mod risk;

pub use blood_pressure::{classify_bp, BpCategory};
pub use fertility::CycleStatus;
pub use kicks::KickAssessment;
pub use labor::{Contraction, LaborAssessment};
pub use risk::{BpReading, RiskAssessment};
