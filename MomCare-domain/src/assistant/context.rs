use chrono::{DateTime, Utc};

use crate::clinical::CycleStatus;
use crate::entities::vital::format_number;
use crate::entities::{Mode, RiskLevel};

/// Pregnancy facts given to the assistant
#[derive(Debug, Clone, PartialEq)]
pub struct PregnancyContext {
    pub week: i64,
    pub trimester: u8,
    pub due_date: DateTime<Utc>,
    pub days_remaining: i64,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
    pub baby_size: String,
}

/// What the assistant knows about the patient it is talking to
#[derive(Debug, Clone, PartialEq)]
pub struct PatientContext {
    pub name: String,
    pub mode: Mode,
    pub age: Option<i64>,
    /// Latest systolic and diastolic
    pub latest_bp: Option<(f64, Option<f64>)>,
    pub weight: Option<f64>,
    pub pregnancy: Option<PregnancyContext>,
    /// Only filled in fertility mode with a known LMP
    pub cycle: Option<CycleStatus>,
}

impl PatientContext {
    pub fn new(name: &str, mode: Mode, age: Option<i64>) -> Self {
        Self {
            name: name.to_string(),
            mode,
            age,
            latest_bp: None,
            weight: None,
            pregnancy: None,
            cycle: None,
        }
    }

    /// `systolic/diastolic`, as patients write it
    pub fn bp_text(&self) -> Option<String> {
        self.latest_bp.map(|(systolic, diastolic)| match diastolic {
            Some(d) => format!("{}/{}", format_number(systolic), format_number(d)),
            None => format_number(systolic),
        })
    }

    pub fn system_prompt(&self) -> String {
        let mut prompt = String::from(
            "You are MomCare, a caring and knowledgeable maternal health assistant.\n\
             You give empathetic, accurate guidance to women tracking fertility or pregnancy.\n\
             Always recommend consulting a healthcare provider for medical decisions.\n\n\
             Patient context:\n",
        );

        prompt.push_str(&format!("- Name: {}\n", self.name));
        if let Some(age) = self.age {
            prompt.push_str(&format!("- Age: {}\n", age));
        }

        match (&self.mode, &self.pregnancy, &self.cycle) {
            (Mode::Pregnancy, Some(p), _) => {
                prompt.push_str("- Mode: Pregnancy\n");
                prompt.push_str(&format!("- Pregnancy week: {}\n", p.week));
                prompt.push_str(&format!("- Trimester: {}\n", p.trimester));
                prompt.push_str(&format!("- Due date: {}\n", p.due_date.format("%Y-%m-%d")));
                prompt.push_str(&format!("- Days remaining: {}\n", p.days_remaining));
                prompt.push_str(&format!("- Risk score: {}/100 ({})\n", p.risk_score, p.risk_level));
                let factors = if p.risk_factors.is_empty() {
                    "None".to_string()
                } else {
                    p.risk_factors.join(", ")
                };
                prompt.push_str(&format!("- Risk factors: {}\n", factors));
                prompt.push_str(&format!("- Baby size: {}\n", p.baby_size));
            }
            (Mode::Pregnancy, None, _) => prompt.push_str("- Mode: Pregnancy\n"),
            (Mode::Fertility, _, Some(c)) => {
                prompt.push_str("- Mode: Fertility tracking\n");
                prompt.push_str(&format!("- Cycle day: {}\n", c.cycle_day));
                prompt.push_str(&format!("- Cycle length: {} days\n", c.cycle_length));
                prompt.push_str(&format!("- Days to ovulation: {}\n", c.days_to_ovulation));
                prompt.push_str(&format!(
                    "- In fertile window: {}\n",
                    if c.in_fertile_window { "Yes" } else { "No" }
                ));
            }
            (Mode::Fertility, _, None) => prompt.push_str("- Mode: Fertility tracking\n"),
        }

        prompt.push_str(&format!(
            "- Latest BP: {}\n",
            self.bp_text().unwrap_or_else(|| "Not recorded".to_string())
        ));
        prompt.push_str(&format!(
            "- Weight: {}\n",
            self.weight
                .map(|w| format!("{} kg", w))
                .unwrap_or_else(|| "Not recorded".to_string())
        ));
        prompt.push_str("\nRespond to the patient's message with care and accuracy. Keep it concise but helpful.");
        prompt
    }
}
