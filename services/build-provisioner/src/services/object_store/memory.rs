use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use build_core::workload::{WorkloadKind, WorkloadSpec};
use kube::api::{ObjectMeta, PropagationPolicy};

use crate::services::object_store::{Deletion, ObjectStore, StoreError};

type Key = (WorkloadKind, String, String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get(WorkloadKind, String),
    Delete(WorkloadKind, String, bool),
    AwaitDeleted(WorkloadKind, String),
    Create(WorkloadKind, String),
}

/// Canned failure for one store operation.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// The object disappears between the caller's lookup and this call.
    NotFound,
    AlreadyExists,
    Rejected(u16),
    Timeout,
}

#[derive(Default)]
struct State {
    objects: HashMap<Key, ObjectMeta>,
    calls: Vec<Call>,
    created: u64,
}

/// In-process stand-in for the control plane. Deletes take effect immediately
/// unless the store is `graceful`, in which case the object lingers until awaited.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    graceful: bool,
    fail_get: Option<Fault>,
    fail_delete: Option<Fault>,
    fail_wait: Option<Fault>,
    fail_create: Option<Fault>,
}

impl MemoryStore {
    pub fn graceful(mut self) -> Self {
        self.graceful = true;
        self
    }

    pub fn failing_get(mut self, fault: Fault) -> Self {
        self.fail_get = Some(fault);
        self
    }

    pub fn failing_delete(mut self, fault: Fault) -> Self {
        self.fail_delete = Some(fault);
        self
    }

    pub fn failing_wait(mut self, fault: Fault) -> Self {
        self.fail_wait = Some(fault);
        self
    }

    pub fn failing_create(mut self, fault: Fault) -> Self {
        self.fail_create = Some(fault);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn seed(&self, kind: WorkloadKind, namespace: &str, name: &str) {
        let meta = ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some("seeded".to_string()),
            ..Default::default()
        };
        self.state()
            .objects
            .insert((kind, namespace.to_string(), name.to_string()), meta);
    }

    pub fn live(&self, kind: WorkloadKind, namespace: &str, name: &str) -> Option<ObjectMeta> {
        self.state()
            .objects
            .get(&(kind, namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.state().objects.len()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    fn fault(fault: Fault, kind: WorkloadKind, name: &str) -> StoreError {
        match fault {
            Fault::NotFound => StoreError::NotFound {
                kind,
                name: name.to_string(),
            },
            Fault::AlreadyExists => StoreError::AlreadyExists {
                kind,
                name: name.to_string(),
            },
            Fault::Rejected(code) => StoreError::Rejected {
                code,
                message: "injected".to_string(),
            },
            Fault::Timeout => StoreError::DeletionTimeout {
                kind,
                name: name.to_string(),
                seconds: 0,
            },
        }
    }
}

impl ObjectStore for MemoryStore {
    async fn get(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<ObjectMeta, StoreError> {
        let mut state = self.state();
        state.calls.push(Call::Get(kind, name.to_string()));

        if let Some(fault) = self.fail_get {
            return Err(Self::fault(fault, kind, name));
        }

        state
            .objects
            .get(&(kind, namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind,
                name: name.to_string(),
            })
    }

    async fn delete(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
        propagation: Option<PropagationPolicy>,
    ) -> Result<Deletion, StoreError> {
        let mut state = self.state();
        let background = matches!(propagation, Some(PropagationPolicy::Background));
        state
            .calls
            .push(Call::Delete(kind, name.to_string(), background));

        let key = (kind, namespace.to_string(), name.to_string());

        if let Some(fault) = self.fail_delete {
            if matches!(fault, Fault::NotFound) {
                state.objects.remove(&key);
            }
            return Err(Self::fault(fault, kind, name));
        }

        if self.graceful {
            return match state.objects.get(&key) {
                Some(meta) => Ok(Deletion::Terminating {
                    uid: meta.uid.clone().unwrap_or_default(),
                }),
                None => Err(StoreError::NotFound {
                    kind,
                    name: name.to_string(),
                }),
            };
        }

        state
            .objects
            .remove(&key)
            .map(|_| Deletion::Gone)
            .ok_or_else(|| StoreError::NotFound {
                kind,
                name: name.to_string(),
            })
    }

    async fn await_deleted(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
        uid: &str,
        _timeout: Duration,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        state.calls.push(Call::AwaitDeleted(kind, name.to_string()));

        if let Some(fault) = self.fail_wait {
            return Err(Self::fault(fault, kind, name));
        }

        // Only the instance that was deleted goes away, a successor keeps its name
        let key = (kind, namespace.to_string(), name.to_string());
        if state
            .objects
            .get(&key)
            .is_some_and(|meta| meta.uid.as_deref() == Some(uid))
        {
            state.objects.remove(&key);
        }

        Ok(())
    }

    async fn create(
        &self,
        namespace: &str,
        workload: &WorkloadSpec,
    ) -> Result<ObjectMeta, StoreError> {
        let kind = workload.kind();
        let name = workload.name().to_string();

        let mut state = self.state();
        state.calls.push(Call::Create(kind, name.clone()));

        if let Some(fault) = self.fail_create {
            return Err(Self::fault(fault, kind, &name));
        }

        let key = (kind, namespace.to_string(), name.clone());
        if state.objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists { kind, name });
        }

        state.created += 1;
        let mut meta = workload.metadata().clone();
        meta.namespace = Some(namespace.to_string());
        meta.uid = Some(format!("uid-{}", state.created));

        state.objects.insert(key, meta.clone());

        Ok(meta)
    }
}
