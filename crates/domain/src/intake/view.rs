use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use cqrs_es::{Aggregate, EventEnvelope, View as CqrsView};
use serde::{Deserialize, Serialize};

use super::{IntakeSession, AGGREGATE_TYPE};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct View {
    pub aggregate_type: String,
    pub id: String,
    pub sequence: usize,
    pub session: IntakeSession,
}

impl CqrsView<IntakeSession> for View {
    fn update(&mut self, event: &EventEnvelope<IntakeSession>) {
        if self.id != event.aggregate_id {
            *self = View::default();
            self.id.clone_from(&event.aggregate_id);
        }
        self.aggregate_type = AGGREGATE_TYPE.to_string();
        self.sequence = event.sequence;
        self.session.apply(event.payload.clone());
    }
}

/// Keeps an in-memory [`View`] current as events are committed.
pub struct Query {
    view: Arc<RwLock<View>>,
}

impl Query {
    pub fn new(view: Arc<RwLock<View>>) -> Self {
        Self { view }
    }
}

#[async_trait]
impl cqrs_es::Query<IntakeSession> for Query {
    async fn dispatch(&self, session_id: &str, events: &[EventEnvelope<IntakeSession>]) {
        let mut view = self.view.write().unwrap_or_else(|poisoned| {
            tracing::error!("Intake view lock poisoned for {}", session_id);
            poisoned.into_inner()
        });

        for event in events {
            view.update(event);
        }
    }
}
