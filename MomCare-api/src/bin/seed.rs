//! Clears the database and loads the demo clinic

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use dotenv::dotenv;
use rand::Rng;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mom_care_data::database::{DatabaseConfig, DatabasePool};
use mom_care_data::repository::Repositories;
use mom_care_domain::auth::password::hash_password;
use mom_care_domain::entities::conversions::{
    convert_to_data_alert, convert_to_data_pregnancy, convert_to_data_user, convert_to_data_vital,
};
use mom_care_domain::entities::{
    Alert, AlertType, BloodType, Mode, Pregnancy, RiskFactor, RiskLevel, Role, Severity, User, Vital, VitalType,
};

const PROVIDER_EMAIL: &str = "provider@demo.com";
const PROVIDER_PASSWORD: &str = "provider123";
const PATIENT_PASSWORD: &str = "patient123";
const BP_HISTORY_DAYS: i64 = 14;

struct DemoPatient {
    name: &'static str,
    email: &'static str,
    age: i64,
    phone: &'static str,
    blood_type: BloodType,
    week: i64,
    risk_score: u32,
    risk_level: RiskLevel,
    /// Oldest to newest; the last one is today's reading
    bp_trend: [(f64, f64); 5],
    /// One per week, oldest first
    weights: [f64; 5],
    factors: &'static [(&'static str, Severity)],
}

const PATIENTS: [DemoPatient; 5] = [
    DemoPatient {
        name: "Priya Sharma",
        email: "priya@demo.com",
        age: 32,
        phone: "+91 98765-43210",
        blood_type: BloodType::OPositive,
        week: 32,
        risk_score: 78,
        risk_level: RiskLevel::High,
        bp_trend: [(118.0, 76.0), (122.0, 78.0), (128.0, 82.0), (135.0, 88.0), (145.0, 95.0)],
        weights: [68.0, 69.5, 70.2, 71.5, 74.5],
        factors: &[("Elevated Blood Pressure", Severity::High), ("Rapid Weight Gain", Severity::Medium)],
    },
    DemoPatient {
        name: "Anjali Gupta",
        email: "anjali@demo.com",
        age: 28,
        phone: "+91 98765-43211",
        blood_type: BloodType::APositive,
        week: 28,
        risk_score: 65,
        risk_level: RiskLevel::Medium,
        bp_trend: [(115.0, 75.0), (120.0, 80.0), (125.0, 82.0), (130.0, 85.0), (142.0, 92.0)],
        weights: [65.0, 66.0, 67.2, 68.0, 69.0],
        factors: &[("High BP Alert", Severity::High)],
    },
    DemoPatient {
        name: "Sneha Patel",
        email: "sneha@demo.com",
        age: 30,
        phone: "+91 98765-43212",
        blood_type: BloodType::BPositive,
        week: 24,
        risk_score: 35,
        risk_level: RiskLevel::Low,
        bp_trend: [(112.0, 72.0), (115.0, 74.0), (110.0, 70.0), (118.0, 76.0), (115.0, 75.0)],
        weights: [60.0, 61.0, 62.0, 63.0, 64.5],
        factors: &[],
    },
    DemoPatient {
        name: "Laxmi Devi",
        email: "laxmi@demo.com",
        age: 35,
        phone: "+91 98765-43213",
        blood_type: BloodType::AbPositive,
        week: 36,
        risk_score: 45,
        risk_level: RiskLevel::Medium,
        bp_trend: [(120.0, 78.0), (122.0, 80.0), (125.0, 82.0), (128.0, 84.0), (130.0, 86.0)],
        weights: [72.0, 73.0, 74.0, 75.0, 76.0],
        factors: &[("Advanced Maternal Age", Severity::Low)],
    },
    DemoPatient {
        name: "Kavita Reddy",
        email: "kavita@demo.com",
        age: 26,
        phone: "+91 98765-43214",
        blood_type: BloodType::ONegative,
        week: 20,
        risk_score: 15,
        risk_level: RiskLevel::Low,
        bp_trend: [(110.0, 70.0), (112.0, 72.0), (108.0, 68.0), (115.0, 74.0), (112.0, 71.0)],
        weights: [55.0, 56.0, 57.0, 58.0, 59.0],
        factors: &[],
    },
];

/// Daily readings following the patient's trend with a little noise; today's is exact
fn bp_history(patient: &DemoPatient, user_id: &str, now: DateTime<Utc>) -> Vec<Vital> {
    let mut rng = rand::thread_rng();
    let steps = patient.bp_trend.len() as i64;

    (0..BP_HISTORY_DAYS)
        .map(|day| {
            let (systolic, diastolic) = patient.bp_trend[(day * steps / BP_HISTORY_DAYS) as usize];
            let days_ago = BP_HISTORY_DAYS - 1 - day;
            let (systolic, diastolic) = if days_ago == 0 {
                (systolic, diastolic)
            } else {
                (systolic + rng.gen_range(-3.0..=3.0_f64).round(), diastolic + rng.gen_range(-2.0..=2.0_f64).round())
            };

            let mut vital = Vital::new(user_id, VitalType::Bp, systolic, Some(diastolic));
            vital.date = now - Duration::days(days_ago);
            vital
        })
        .collect()
}

fn weight_history(patient: &DemoPatient, user_id: &str, now: DateTime<Utc>) -> Vec<Vital> {
    let weeks = patient.weights.len() as i64;
    patient
        .weights
        .iter()
        .enumerate()
        .map(|(i, weight)| {
            let mut vital = Vital::new(user_id, VitalType::Weight, *weight, None);
            vital.date = now - Duration::weeks(weeks - 1 - i as i64);
            vital
        })
        .collect()
}

fn seed_alert(patient: &DemoPatient, patient_id: &str, provider_id: &str) -> Option<Alert> {
    match patient.risk_level {
        RiskLevel::High => {
            let (systolic, diastolic) = patient.bp_trend[patient.bp_trend.len() - 1];
            Some(Alert::new(
                patient_id,
                Some(provider_id),
                AlertType::Critical,
                "Blood Pressure Spike",
                format!("BP reading: {}/{} mmHg - Above normal threshold", systolic, diastolic),
            ))
        }
        RiskLevel::Medium => Some(Alert::new(
            patient_id,
            Some(provider_id),
            AlertType::Warning,
            "Elevated Vitals",
            "Some vitals require monitoring",
        )),
        RiskLevel::Low => None,
    }
}

async fn seed_patient(
    repos: &Repositories,
    patient: &DemoPatient,
    provider_id: &str,
    password_hash: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let lmp = now - Duration::weeks(patient.week);

    let mut user = User::new(patient.email, password_hash.to_string(), patient.name, Role::Patient, Mode::Pregnancy);
    user.age = Some(patient.age);
    user.phone = Some(patient.phone.to_string());
    user.blood_type = Some(patient.blood_type);
    user.provider_id = Some(provider_id.to_string());
    user.last_menstrual_period = Some(lmp);
    repos.users.create(convert_to_data_user(&user)).await?;

    // Score and level are curated, not derived from the score bands
    let mut pregnancy = Pregnancy::start(&user.id, lmp, now);
    pregnancy.risk_score = patient.risk_score;
    pregnancy.risk_level = patient.risk_level;
    pregnancy.risk_factors = patient
        .factors
        .iter()
        .map(|(factor, severity)| RiskFactor {
            factor: factor.to_string(),
            severity: *severity,
            added_at: now,
        })
        .collect();
    repos.pregnancies.create(convert_to_data_pregnancy(&pregnancy)).await?;

    for vital in bp_history(patient, &user.id, now).into_iter().chain(weight_history(patient, &user.id, now)) {
        repos.vitals.create(convert_to_data_vital(&vital)).await?;
    }

    if let Some(alert) = seed_alert(patient, &user.id, provider_id) {
        repos.alerts.create(convert_to_data_alert(&alert)).await?;
    }

    info!("✅ Created patient: {} ({}, week {})", patient.name, patient.risk_level, patient.week);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🌱 Starting database seed...");

    let config = DatabaseConfig::from_env().context("Invalid database configuration")?;
    let pool = DatabasePool::initialize(&config).context("Failed to open database")?;
    info!("Seeding {}", pool.connection_info());

    pool.clear().context("Failed to clear existing data")?;
    info!("🗑️  Cleared existing data");

    let repos = Repositories::sqlite(pool);
    let now = Utc::now();

    let provider_hash = hash_password(PROVIDER_PASSWORD)?;
    let provider = User::new(PROVIDER_EMAIL, provider_hash, "Dr. Sarah Johnson", Role::Provider, Mode::Fertility);
    repos.users.create(convert_to_data_user(&provider)).await?;
    info!("👩‍⚕️ Created provider: {} / {}", PROVIDER_EMAIL, PROVIDER_PASSWORD);

    let patient_hash = hash_password(PATIENT_PASSWORD)?;
    for patient in &PATIENTS {
        seed_patient(&repos, patient, &provider.id, &patient_hash, now)
            .await
            .with_context(|| format!("Failed to seed {}", patient.name))?;
    }

    info!("🎉 Database seeded successfully");
    info!("Provider: {} / {}", PROVIDER_EMAIL, PROVIDER_PASSWORD);
    info!("Patients: priya@demo.com (and the other demo addresses) / {}", PATIENT_PASSWORD);
    Ok(())
}
