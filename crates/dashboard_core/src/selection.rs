use crate::ContactId;

/// Contacts picked for a batch dispatch, in the order they were picked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    ids: Vec<ContactId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `id`; returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: ContactId) -> bool {
        if let Some(pos) = self.ids.iter().position(|existing| *existing == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    pub fn insert(&mut self, id: ContactId) {
        if !self.contains(id) {
            self.ids.push(id);
        }
    }

    pub fn contains(&self, id: ContactId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[ContactId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
