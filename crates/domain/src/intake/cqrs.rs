use std::sync::{Arc, RwLock};

use cqrs_es::{mem_store::MemStore, CqrsFramework};
use ulid::Ulid;

use crate::errors::Error;

use super::{Command, IntakeSession, Query, Services, View};

pub type IntakeCqrs = CqrsFramework<IntakeSession, MemStore<IntakeSession>>;

pub fn init(view: Arc<RwLock<View>>) -> IntakeCqrs {
    let store = MemStore::<IntakeSession>::default();
    let queries: Vec<Box<dyn cqrs_es::Query<IntakeSession>>> = vec![Box::new(Query::new(view))];

    CqrsFramework::new(store, queries, Services::default())
}

/// One authenticated intake pass. Dropping it discards every event it
/// recorded.
pub struct Workflow {
    id: String,
    cqrs: IntakeCqrs,
    view: Arc<RwLock<View>>,
}

impl Workflow {
    pub async fn open() -> Result<Self, Error> {
        let view = Arc::new(RwLock::new(View::default()));
        let workflow = Self {
            id: Ulid::new().to_string(),
            cqrs: init(view.clone()),
            view,
        };

        workflow
            .execute(Command::StartSession {
                id: workflow.id.clone(),
            })
            .await?;
        tracing::info!(session_id = %workflow.id, "Intake session opened");
        Ok(workflow)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn execute(&self, command: Command) -> Result<(), Error> {
        self.cqrs.execute(&self.id, command).await.map_err(Error::from)
    }

    pub fn snapshot(&self) -> IntakeSession {
        self.view
            .read()
            .map(|view| view.session.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().session.clone())
    }
}
