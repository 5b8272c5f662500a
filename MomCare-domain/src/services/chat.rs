use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use mom_care_data::repository::Repositories;

use super::{active_pregnancy, ServiceError};
use crate::assistant::context::PregnancyContext;
use crate::assistant::{fallback, PatientContext, TextGenerator};
use crate::clinical::CycleStatus;
use crate::entities::conversions::{convert_all, convert_to_data_message, convert_to_domain_message};
use crate::entities::{Message, Mode, User, VitalType};

const HISTORY_LIMIT: usize = 50;

/// A user message and the assistant's answer
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ChatExchange {
    pub user_message: Message,
    pub ai_message: Message,
}

/// Assistant chat, stored as a thread from the patient to themselves
pub struct ChatService {
    repos: Repositories,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl ChatService {
    pub fn new(repos: Repositories, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { repos, generator }
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn send(&self, user: &User, message: &str) -> Result<ChatExchange, ServiceError> {
        let content = message.trim();
        if content.is_empty() {
            return Err(ServiceError::Validation("Message required".to_string()));
        }

        let user_message = Message::new(&user.id, &user.id, content, false);
        self.repos.messages.create(convert_to_data_message(&user_message)).await?;

        let context = self.patient_context(user).await?;
        let reply = match &self.generator {
            Some(generator) => match generator.generate(&context.system_prompt(), content).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Assistant generation failed, using fallback reply: {}", e);
                    fallback::reply(content, &context)
                }
            },
            None => fallback::reply(content, &context),
        };

        let ai_message = Message::new(&user.id, &user.id, &reply, true);
        self.repos.messages.create(convert_to_data_message(&ai_message)).await?;
        debug!("Stored assistant exchange for user {}", user.id);

        Ok(ChatExchange { user_message, ai_message })
    }

    /// Chronological
    pub async fn history(&self, user: &User) -> Result<Vec<Message>, ServiceError> {
        let records = self.repos.messages.conversation(&user.id, &user.id, HISTORY_LIMIT).await?;
        Ok(convert_all(records, convert_to_domain_message)?)
    }

    async fn patient_context(&self, user: &User) -> Result<PatientContext, ServiceError> {
        let now = Utc::now();
        let mut context = PatientContext::new(&user.name, user.current_mode, user.age);

        context.latest_bp = self
            .repos
            .vitals
            .latest(&user.id, VitalType::Bp.as_str())
            .await?
            .map(|v| (v.value, v.secondary_value));
        context.weight = self
            .repos
            .vitals
            .latest(&user.id, VitalType::Weight.as_str())
            .await?
            .map(|v| v.value)
            .or(user.weight);

        match user.current_mode {
            Mode::Pregnancy => {
                context.pregnancy = active_pregnancy(&self.repos, &user.id).await?.map(|p| PregnancyContext {
                    week: p.current_week(now),
                    trimester: p.trimester(now),
                    due_date: p.due_date,
                    days_remaining: p.days_remaining(now),
                    risk_score: p.risk_score,
                    risk_level: p.risk_level,
                    baby_size: p.baby_size_comparison(now).to_string(),
                    risk_factors: p.risk_factors.into_iter().map(|f| f.factor).collect(),
                });
            }
            Mode::Fertility => {
                context.cycle = user
                    .last_menstrual_period
                    .map(|lmp| CycleStatus::compute(lmp, user.average_cycle_length, now));
            }
        }

        Ok(context)
    }
}
