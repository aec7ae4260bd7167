//! In-memory document store.
//!
//! Every collection lives behind one `tokio::sync::RwLock`. Writes go through
//! [`MemoryStore::transaction`]: the closure stages puts and deletes against a
//! read view, and the staged changes are applied only if it returns `Ok`.
//! Two documents updated in one transaction are therefore never observed
//! half-written.

use std::collections::HashMap;

use anyhow::Result;
use tokio::sync::RwLock;

use crate::errors::SocietyError;
use crate::models::{Bill, Document, Resident, ScheduledBill, SocialComment, SocialPost, Society, VisitorLog};

/// One collection, keyed by document id.
#[derive(Debug, Clone)]
pub struct Table<T> {
    docs: HashMap<String, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self { docs: HashMap::new() }
    }
}

impl<T: Document> Table<T> {
    pub fn get(&self, id: &str) -> Option<&T> {
        self.docs.get(id)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.docs.values()
    }

    pub fn in_society<'a>(&'a self, society_id: &'a str) -> impl Iterator<Item = &'a T> + 'a {
        self.docs.values().filter(move |d| d.society_id() == society_id)
    }

    /// The document, if it exists and belongs to `society_id`. Documents of
    /// other societies are reported as missing.
    pub fn require(&self, society_id: &str, id: &str, label: &str) -> Result<T> {
        self.get(id)
            .filter(|d| d.society_id() == society_id)
            .cloned()
            .ok_or_else(|| not_found(label, id))
    }
}

fn not_found(label: &str, id: &str) -> anyhow::Error {
    SocietyError::not_found(format!("{label} not found: {id}")).into_anyhow()
}

#[derive(Debug, Default)]
pub struct Collections {
    pub societies: Table<Society>,
    pub residents: Table<Resident>,
    pub posts: Table<SocialPost>,
    pub comments: Table<SocialComment>,
    pub bills: Table<Bill>,
    pub scheduled_bills: Table<ScheduledBill>,
    pub visitors: Table<VisitorLog>,
}

/// Pending writes to one collection on top of its committed state.
pub struct Staged<'a, T> {
    base: &'a Table<T>,
    changes: HashMap<String, Option<T>>,
}

impl<'a, T: Document> Staged<'a, T> {
    fn new(base: &'a Table<T>) -> Self {
        Self {
            base,
            changes: HashMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        match self.changes.get(id) {
            Some(staged) => staged.as_ref(),
            None => self.base.get(id),
        }
    }

    /// Like [`Table::require`], seeing staged writes.
    pub fn require(&self, society_id: &str, id: &str, label: &str) -> Result<T> {
        self.get(id)
            .filter(|d| d.society_id() == society_id)
            .cloned()
            .ok_or_else(|| not_found(label, id))
    }

    pub fn put(&mut self, doc: T) {
        self.changes.insert(doc.id().to_string(), Some(doc));
    }

    /// Stage a delete. Returns the document as it was.
    pub fn delete(&mut self, id: &str) -> Option<T> {
        let prev = self.get(id).cloned();
        if prev.is_some() {
            self.changes.insert(id.to_string(), None);
        }
        prev
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let committed = self
            .base
            .docs
            .iter()
            .filter(|(id, _)| !self.changes.contains_key(*id))
            .map(|(_, d)| d);
        committed.chain(self.changes.values().filter_map(|d| d.as_ref()))
    }

    pub fn in_society<'s>(&'s self, society_id: &'s str) -> impl Iterator<Item = &'s T> + 's {
        self.iter().filter(move |d| d.society_id() == society_id)
    }

    fn into_changes(self) -> HashMap<String, Option<T>> {
        self.changes
    }
}

fn apply<T>(table: &mut Table<T>, changes: HashMap<String, Option<T>>) {
    for (id, change) in changes {
        match change {
            Some(doc) => {
                table.docs.insert(id, doc);
            }
            None => {
                table.docs.remove(&id);
            }
        }
    }
}

/// A write transaction. Built by [`MemoryStore::transaction`].
pub struct Transaction<'a> {
    pub societies: Staged<'a, Society>,
    pub residents: Staged<'a, Resident>,
    pub posts: Staged<'a, SocialPost>,
    pub comments: Staged<'a, SocialComment>,
    pub bills: Staged<'a, Bill>,
    pub scheduled_bills: Staged<'a, ScheduledBill>,
    pub visitors: Staged<'a, VisitorLog>,
}

struct Changes {
    societies: HashMap<String, Option<Society>>,
    residents: HashMap<String, Option<Resident>>,
    posts: HashMap<String, Option<SocialPost>>,
    comments: HashMap<String, Option<SocialComment>>,
    bills: HashMap<String, Option<Bill>>,
    scheduled_bills: HashMap<String, Option<ScheduledBill>>,
    visitors: HashMap<String, Option<VisitorLog>>,
}

impl<'a> Transaction<'a> {
    fn new(base: &'a Collections) -> Self {
        Self {
            societies: Staged::new(&base.societies),
            residents: Staged::new(&base.residents),
            posts: Staged::new(&base.posts),
            comments: Staged::new(&base.comments),
            bills: Staged::new(&base.bills),
            scheduled_bills: Staged::new(&base.scheduled_bills),
            visitors: Staged::new(&base.visitors),
        }
    }

    fn into_changes(self) -> Changes {
        Changes {
            societies: self.societies.into_changes(),
            residents: self.residents.into_changes(),
            posts: self.posts.into_changes(),
            comments: self.comments.into_changes(),
            bills: self.bills.into_changes(),
            scheduled_bills: self.scheduled_bills.into_changes(),
            visitors: self.visitors.into_changes(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&Collections) -> T,
    {
        let guard = self.inner.read().await;
        f(&guard)
    }

    /// Run `f` against a staged view and commit its writes if it succeeds.
    /// On `Err` nothing is written.
    pub async fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T>,
    {
        let mut guard = self.inner.write().await;
        let (out, changes) = {
            let mut tx = Transaction::new(&guard);
            let out = f(&mut tx)?;
            (out, tx.into_changes())
        };

        let c = &mut *guard;
        apply(&mut c.societies, changes.societies);
        apply(&mut c.residents, changes.residents);
        apply(&mut c.posts, changes.posts);
        apply(&mut c.comments, changes.comments);
        apply(&mut c.bills, changes.bills);
        apply(&mut c.scheduled_bills, changes.scheduled_bills);
        apply(&mut c.visitors, changes.visitors);
        Ok(out)
    }
}
