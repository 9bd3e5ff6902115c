use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::billing::BilledEntity;
use crate::domain::foundation::{DomainError, PlanId, SubscriptionId, Timestamp};
use crate::domain::subscription::{
    decide_activation, Activation, ActivationDecision, ActivationRequest, Subscription,
};
use crate::ports::SubscriptionRepository;

use super::lock;

#[derive(Default)]
struct StoreState {
    next_id: i64,
    rows: Vec<Subscription>,
}

/// Subscription store that serialises activations with a single lock.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    state: Mutex<StoreState>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a row as if an earlier flow had created it.
    pub fn insert(&self, mut subscription: Subscription) -> Result<Subscription, DomainError> {
        let mut state = lock(&self.state, "InMemorySubscriptionStore")?;
        state.next_id += 1;
        subscription.id = SubscriptionId::from_db(state.next_id);
        state.rows.push(subscription.clone());
        Ok(subscription)
    }

    /// Snapshot of every row in insertion order.
    pub fn all(&self) -> Vec<Subscription> {
        lock(&self.state, "InMemorySubscriptionStore")
            .map(|state| state.rows.clone())
            .unwrap_or_default()
    }
}

fn matches_pair(row: &Subscription, entity: BilledEntity, plan_id: PlanId) -> bool {
    row.billed_entity == entity && row.plan_id == plan_id && row.is_open()
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionStore {
    async fn activate(&self, request: ActivationRequest) -> Result<Activation, DomainError> {
        let mut state = lock(&self.state, "InMemorySubscriptionStore")?;
        let now = Timestamp::now();

        let open_index = state
            .rows
            .iter()
            .position(|row| matches_pair(row, request.billed_entity, request.plan_id));
        let open = open_index.map(|i| state.rows[i].clone());

        let decision = decide_activation(open, &request, now);
        let outcome = decision.outcome();
        let subscription = match decision {
            ActivationDecision::KeepActive(existing) => existing,
            ActivationDecision::Promote(updated) => {
                if let Some(i) = open_index {
                    state.rows[i] = updated.clone();
                }
                updated
            }
            ActivationDecision::Create(new) => {
                state.next_id += 1;
                let created = Subscription::from_new(SubscriptionId::from_db(state.next_id), new, now);
                state.rows.push(created.clone());
                created
            }
        };

        Ok(Activation {
            subscription,
            outcome,
        })
    }

    async fn find_open(
        &self,
        billed_entity: BilledEntity,
        plan_id: PlanId,
    ) -> Result<Option<Subscription>, DomainError> {
        let state = lock(&self.state, "InMemorySubscriptionStore")?;
        Ok(state
            .rows
            .iter()
            .find(|row| matches_pair(row, billed_entity, plan_id))
            .cloned())
    }
}
