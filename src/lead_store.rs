use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::Lead;

/// Where leads live between requests. Leads are never deleted.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Option<Lead>;

    /// All leads, oldest first.
    async fn list(&self) -> Vec<Lead>;

    /// Inserts or replaces the lead with the same id.
    async fn upsert(&self, lead: Lead);

    async fn upsert_many(&self, leads: Vec<Lead>) {
        for lead in leads {
            self.upsert(lead).await;
        }
    }

    /// Applies `change` to the stored lead in place, without letting another
    /// write land in between. `None` for an unknown id.
    async fn update(&self, id: Uuid, change: &(dyn for<'a> Fn(&'a mut Lead) + Send + Sync)) -> Option<Lead>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryLeadStore {
    leads: RwLock<HashMap<Uuid, Lead>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn get(&self, id: Uuid) -> Option<Lead> {
        self.leads.read().await.get(&id).cloned()
    }

    async fn list(&self) -> Vec<Lead> {
        let mut leads: Vec<Lead> = self.leads.read().await.values().cloned().collect();
        leads.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        leads
    }

    async fn upsert(&self, lead: Lead) {
        self.leads.write().await.insert(lead.id, lead);
    }

    async fn upsert_many(&self, leads: Vec<Lead>) {
        let mut guard = self.leads.write().await;
        for lead in leads {
            guard.insert(lead.id, lead);
        }
    }

    async fn update(&self, id: Uuid, change: &(dyn for<'a> Fn(&'a mut Lead) + Send + Sync)) -> Option<Lead> {
        let mut guard = self.leads.write().await;
        let lead = guard.get_mut(&id)?;
        change(lead);
        Some(lead.clone())
    }
}
