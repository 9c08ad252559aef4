use crate::model::{Described, ObjectHandle};

pub const LOADING_TITLE: &str = "Loading…";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TabState {
    Loading,
    Shown,
}

#[derive(Debug, Clone)]
pub struct DetailTab {
    pub key: ObjectHandle,
    pub code: &'static str,
    pub namespace: Option<String>,
    pub title: String,
    pub body: String,
    pub state: TabState,
    pub scroll: u16,
}

impl DetailTab {
    pub fn is_error(&self) -> bool {
        self.state == TabState::Shown && self.title == Described::ERROR_TITLE
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Opened {
    pub index: usize,
    pub created: bool,
    pub describe: bool,
}

#[derive(Debug, Default)]
pub struct DetailViewer {
    tabs: Vec<DetailTab>,
    selected: Option<usize>,
}

impl DetailViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(
        &mut self,
        code: &'static str,
        object: ObjectHandle,
        namespace: Option<String>,
    ) -> Opened {
        if let Some(index) = self.find(&object) {
            self.selected = Some(index);
            // a describe is already outstanding for a loading tab
            let describe = self.tabs[index].state == TabState::Shown;
            return Opened {
                index,
                created: false,
                describe,
            };
        }

        self.tabs.push(DetailTab {
            key: object,
            code,
            namespace,
            title: LOADING_TITLE.to_string(),
            body: String::new(),
            state: TabState::Loading,
            scroll: 0,
        });
        let index = self.tabs.len() - 1;
        self.selected = Some(index);
        Opened {
            index,
            created: true,
            describe: true,
        }
    }

    /// Stores a describe result on the tab keyed by `key`. Returns false when
    /// that tab was closed in the meantime.
    pub fn apply(&mut self, key: &ObjectHandle, described: Described) -> bool {
        let Some(index) = self.find(key) else {
            return false;
        };
        let tab = &mut self.tabs[index];
        tab.title = described.title;
        tab.body = described.body;
        tab.state = TabState::Shown;
        true
    }

    pub fn find(&self, key: &ObjectHandle) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.key == *key)
    }

    pub fn tabs(&self) -> &[DetailTab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&DetailTab> {
        self.selected.and_then(|index| self.tabs.get(index))
    }

    pub fn close_selected(&mut self) -> Option<DetailTab> {
        let index = self.selected?;
        if index >= self.tabs.len() {
            self.selected = None;
            return None;
        }
        let closed = self.tabs.remove(index);
        self.selected = if self.tabs.is_empty() {
            None
        } else {
            Some(index.min(self.tabs.len() - 1))
        };
        Some(closed)
    }

    pub fn clear(&mut self) {
        self.tabs.clear();
        self.selected = None;
    }

    pub fn select_next(&mut self) {
        if self.tabs.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(index) => (index + 1) % self.tabs.len(),
            None => 0,
        });
    }

    pub fn select_prev(&mut self) {
        if self.tabs.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(0) | None => self.tabs.len() - 1,
            Some(index) => index - 1,
        });
    }

    pub fn scroll(&mut self, delta: i32) {
        let Some(tab) = self.selected.and_then(|index| self.tabs.get_mut(index)) else {
            return;
        };
        let max = u16::try_from(tab.body.lines().count().saturating_sub(1)).unwrap_or(u16::MAX);
        let next = i32::from(tab.scroll).saturating_add(delta).clamp(0, i32::from(max));
        tab.scroll = u16::try_from(next).unwrap_or(max);
    }
}
