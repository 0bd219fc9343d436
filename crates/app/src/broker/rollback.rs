use common::prelude::{AdminApi, StorageApi};

/// Undo action for one committed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Undo {
    DeleteGroup { id: String, name: String },
    DeleteBucket { name: String },
}

/// Compensating actions for a multi step call.
///
/// Steps are recorded as they commit. If the call fails, [`Rollback::run`]
///  undoes them newest first. Undo failures are logged and otherwise
///  ignored; the error that triggered the rollback is what the caller sees.
pub(crate) struct Rollback<'a> {
    admin: &'a dyn AdminApi,
    storage: &'a dyn StorageApi,
    steps: Vec<Undo>,
}

impl<'a> Rollback<'a> {
    pub(crate) fn new(admin: &'a dyn AdminApi, storage: &'a dyn StorageApi) -> Self {
        Self {
            admin,
            storage,
            steps: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, undo: Undo) {
        self.steps.push(undo);
    }

    /// Keep everything; the call succeeded
    pub(crate) fn commit(self) {
        tracing::debug!(steps = self.steps.len(), "committed");
    }

    pub(crate) async fn run(self) {
        for undo in self.steps.into_iter().rev() {
            match &undo {
                Undo::DeleteBucket { name } => {
                    if let Err(e) = self.storage.delete_bucket(name).await {
                        if !e.is_not_found() {
                            tracing::error!(bucket = %name, error = %e, "rollback: failed to delete bucket");
                        }
                    } else {
                        tracing::info!(bucket = %name, "rollback: deleted bucket");
                    }
                }
                Undo::DeleteGroup { id, name } => {
                    if let Err(e) = self.admin.delete_group(id).await {
                        tracing::error!(group = %name, error = %e, "rollback: failed to delete group");
                    } else {
                        tracing::info!(group = %name, "rollback: deleted group");
                    }
                }
            }
        }
    }
}
