//! Keyword-driven replies used when no text generator answers

use super::context::PatientContext;
use crate::entities::Mode;

pub fn reply(message: &str, context: &PatientContext) -> String {
    let lower = message.to_lowercase();
    match context.mode {
        Mode::Pregnancy => pregnancy_reply(&lower, context),
        Mode::Fertility => fertility_reply(&lower, context),
    }
}

fn week_text(context: &PatientContext) -> String {
    context
        .pregnancy
        .as_ref()
        .map(|p| p.week.to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn pregnancy_reply(lower: &str, context: &PatientContext) -> String {
    let week = week_text(context);

    if lower.contains("bp") || lower.contains("blood pressure") {
        return match (context.latest_bp, context.bp_text()) {
            (Some((systolic, diastolic)), Some(bp)) => {
                if systolic >= 140.0 || diastolic.is_some_and(|d| d >= 90.0) {
                    let score = context.pregnancy.as_ref().map(|p| p.risk_score).unwrap_or(0);
                    format!(
                        "Your recent BP of {} mmHg is elevated. This is important to monitor at week {}. I recommend:\n\n\
                         • Rest and lie on your left side\n\
                         • Avoid salty foods\n\
                         • Stay hydrated\n\
                         • Recheck in 4 hours\n\
                         • Contact your doctor if it stays high or you have headaches or vision changes\n\n\
                         Your current risk score is {}/100. Please monitor closely. 💗",
                        bp, week, score
                    )
                } else {
                    format!(
                        "Your recent BP of {} mmHg looks good! Keep monitoring regularly at week {}. 💗",
                        bp, week
                    )
                }
            }
            _ => "I don't see a recent BP reading. Would you like to log one now? Regular monitoring is important during pregnancy. 💗".to_string(),
        };
    }

    if lower.contains("kick") || lower.contains("movement") {
        return format!(
            "At week {}, you should feel regular movements. A healthy pattern is 10+ kicks in 2 hours. \
             If you notice decreased movement, lie on your left side, drink cold water, and count kicks. \
             Contact your provider if you get fewer than 10 in 2 hours. 💗",
            week
        );
    }

    if lower.contains("week") || lower.contains("baby") || lower.contains("size") {
        let (size, remaining) = context
            .pregnancy
            .as_ref()
            .map(|p| (p.baby_size.clone(), p.days_remaining))
            .unwrap_or_else(|| ("growing baby".to_string(), 0));
        let countdown = if remaining > 0 {
            format!(" Only {} days until your due date!", remaining)
        } else {
            String::new()
        };
        return format!(
            "You're at week {}! Your baby is about the size of a {}.{} 🍼💗",
            week, size, countdown
        );
    }

    let level = context
        .pregnancy
        .as_ref()
        .map(|p| p.risk_level.to_string())
        .unwrap_or_else(|| "low".to_string());
    format!(
        "I'm here to help with your pregnancy at week {}! Your current risk level is {}. Feel free to ask about:\n\n\
         • Blood pressure concerns\n\
         • Baby movements\n\
         • Symptoms you're experiencing\n\
         • What to expect this week\n\n\
         How can I assist you today? 💗",
        week, level
    )
}

fn fertility_reply(lower: &str, context: &PatientContext) -> String {
    if lower.contains("ovulat") || lower.contains("fertile") {
        return match &context.cycle {
            Some(cycle) if cycle.in_fertile_window => {
                let when = if cycle.days_to_ovulation == 0 {
                    "today".to_string()
                } else {
                    format!("in {} days", cycle.days_to_ovulation.abs())
                };
                format!(
                    "You're in your fertile window! This is a great time if you're trying to conceive. Ovulation is expected {}. 🌸",
                    when
                )
            }
            Some(cycle) => format!(
                "Your estimated ovulation is in {} days (around cycle day {}). Your fertile window will start about 3 days before that. 🌸",
                cycle.days_to_ovulation, cycle.ovulation_day
            ),
            None => "To predict ovulation, I need your last period date. Would you like to update that? 🌸".to_string(),
        };
    }

    if lower.contains("period") || lower.contains("cycle") {
        if let Some(cycle) = &context.cycle {
            let window = if cycle.in_fertile_window {
                "You're currently in your fertile window!"
            } else if cycle.days_to_ovulation > 0 {
                "Your fertile window starts soon."
            } else {
                "Your fertile window has passed for this cycle."
            };
            return format!(
                "You're on cycle day {} of your {}-day cycle. {} 🌸",
                cycle.cycle_day, cycle.cycle_length, window
            );
        }
    }

    let day = context
        .cycle
        .map(|c| c.cycle_day.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!(
        "I'm here to help with your fertility journey! You're on cycle day {}. Ask me about:\n\n\
         • Ovulation prediction\n\
         • Fertile window timing\n\
         • Cycle symptoms\n\
         • Tips for conception\n\n\
         How can I help today? 🌸",
        day
    )
}
