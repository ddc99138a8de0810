use std::sync::Arc;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{IdGenerator, Notification, Notifier, ResultEngine, UuidV7Generator};

mod access;
mod balances;
mod categories;
mod join_requests;
mod members;
mod pockets;
mod spends;
mod users;

pub use pockets::POCKET_CURSOR_TYPES;
pub use spends::SPEND_CURSOR_TYPES;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// Dropping the future before it completes drops the transaction, which rolls
/// it back as well.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    ids: Arc<dyn IdGenerator>,
    notifier: Option<Notifier>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    fn next_id(&self) -> Uuid {
        self.ids.next_id()
    }

    /// Queue a notification. Call only after the producing transaction committed.
    fn notify(&self, user_ids: Vec<String>, title: impl Into<String>, body: impl Into<String>) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        notifier.send(Notification {
            user_ids,
            title: title.into(),
            body: body.into(),
        });
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    ids: Option<Arc<dyn IdGenerator>>,
    notifier: Option<Notifier>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the default UUIDv7 id source.
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> EngineBuilder {
        self.ids = Some(ids);
        self
    }

    /// Without a notifier, notifications are dropped.
    pub fn notifier(mut self, notifier: Notifier) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            ids: self.ids.unwrap_or_else(|| Arc::new(UuidV7Generator)),
            notifier: self.notifier,
        })
    }
}
