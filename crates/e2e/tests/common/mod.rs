//! In-memory document used in place of a browser.
//!
//! Every handle or driver call advances a tick counter. Clicks can schedule
//! changes a number of ticks later, which is how tests model work that
//! finishes while a wait is polling.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use molview_e2e::{Driver, E2eError, E2eResult};
use molview_waiters::{Handle, HandleError, Locator};
use serde_json::Value;

pub type NodeId = usize;

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    tag: String,
    attributes: HashMap<String, String>,
    /// Selectors this node answers to besides id, class and tag
    css: Vec<String>,
    text: String,
    present: bool,
}

#[derive(Debug, Clone)]
pub enum Change {
    Attribute {
        node: NodeId,
        name: String,
        value: Option<String>,
    },
    Present { node: NodeId, present: bool },
}

impl Change {
    pub fn attr(node: NodeId, name: &str, value: Option<&str>) -> Self {
        Change::Attribute {
            node,
            name: name.to_string(),
            value: value.map(String::from),
        }
    }

    pub fn remove(node: NodeId) -> Self {
        Change::Present {
            node,
            present: false,
        }
    }

    pub fn insert(node: NodeId) -> Self {
        Change::Present {
            node,
            present: true,
        }
    }
}

#[derive(Default)]
pub struct FakeDom {
    nodes: RefCell<Vec<Node>>,
    ticks: Cell<u64>,
    pending: RefCell<Vec<(u64, Change)>>,
    on_click: RefCell<HashMap<NodeId, Vec<(u64, Change)>>>,
    scripts: RefCell<HashMap<String, VecDeque<Result<Value, HandleError>>>>,
    pub log: RefCell<Vec<String>>,
    /// Shared so tests can observe it after the runner drops the driver
    pub closed: Rc<Cell<bool>>,
    pub fail_close: Cell<bool>,
}

impl FakeDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; `id` and `class` are set as attributes when given
    pub fn add(&self, parent: Option<NodeId>, tag: &str, id: Option<&str>, class: Option<&str>) -> NodeId {
        let mut attributes = HashMap::new();
        if let Some(id) = id {
            attributes.insert("id".to_string(), id.to_string());
        }
        if let Some(class) = class {
            attributes.insert("class".to_string(), class.to_string());
        }
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(Node {
            parent,
            tag: tag.to_string(),
            attributes,
            css: Vec::new(),
            text: String::new(),
            present: true,
        });
        nodes.len() - 1
    }

    pub fn add_rows(&self, parent: NodeId, count: usize) {
        for _ in 0..count {
            self.add(Some(parent), "tr", None, None);
        }
    }

    pub fn set_text(&self, node: NodeId, text: &str) {
        self.nodes.borrow_mut()[node].text = text.to_string();
    }

    pub fn set_attr(&self, node: NodeId, name: &str, value: &str) {
        self.nodes.borrow_mut()[node]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn alias(&self, node: NodeId, selector: &str) {
        self.nodes.borrow_mut()[node].css.push(selector.to_string());
    }

    pub fn hide(&self, node: NodeId) {
        self.nodes.borrow_mut()[node].present = false;
    }

    /// Apply `change` `delay` ticks after `node` is clicked
    pub fn on_click(&self, node: NodeId, delay: u64, change: Change) {
        self.on_click
            .borrow_mut()
            .entry(node)
            .or_default()
            .push((delay, change));
    }

    pub fn script_results(&self, script: &str, results: Vec<Result<Value, HandleError>>) {
        self.scripts
            .borrow_mut()
            .insert(script.to_string(), results.into_iter().collect());
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.borrow()[node].attributes.get(name).cloned()
    }

    pub fn logged(&self, prefix: &str) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter(|l| l.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn tick(&self) {
        let now = self.ticks.get() + 1;
        self.ticks.set(now);

        let due: Vec<Change> = {
            let mut pending = self.pending.borrow_mut();
            let (due, later): (Vec<_>, Vec<_>) = pending.drain(..).partition(|(at, _)| *at <= now);
            *pending = later;
            due.into_iter().map(|(_, change)| change).collect()
        };
        for change in due {
            self.apply(change);
        }
    }

    fn apply(&self, change: Change) {
        let mut nodes = self.nodes.borrow_mut();
        match change {
            Change::Attribute { node, name, value } => match value {
                Some(value) => {
                    nodes[node].attributes.insert(name, value);
                }
                None => {
                    nodes[node].attributes.remove(&name);
                }
            },
            Change::Present { node, present } => nodes[node].present = present,
        }
    }

    fn matches(node: &Node, locator: &Locator) -> bool {
        match locator {
            Locator::Id(id) => node.attributes.get("id") == Some(id),
            Locator::ClassName(class) => node
                .attributes
                .get("class")
                .map_or(false, |c| c.split_whitespace().any(|t| t == class)),
            Locator::TagName(tag) => &node.tag == tag,
            Locator::Css(selector) => node.css.iter().any(|s| s == selector),
        }
    }

    fn is_visible(nodes: &[Node], mut id: NodeId) -> bool {
        loop {
            if !nodes[id].present {
                return false;
            }
            match nodes[id].parent {
                Some(parent) => id = parent,
                None => return true,
            }
        }
    }

    fn is_descendant(nodes: &[Node], mut id: NodeId, ancestor: NodeId) -> bool {
        while let Some(parent) = nodes[id].parent {
            if parent == ancestor {
                return true;
            }
            id = parent;
        }
        false
    }

    fn query(&self, parent: Option<NodeId>, locator: &Locator) -> Vec<NodeId> {
        self.tick();
        let nodes = self.nodes.borrow();
        (0..nodes.len())
            .filter(|&id| Self::is_visible(&nodes, id))
            .filter(|&id| parent.map_or(true, |p| Self::is_descendant(&nodes, id, p)))
            .filter(|&id| Self::matches(&nodes[id], locator))
            .collect()
    }

    fn not_found(locator: &Locator) -> E2eError {
        E2eError::Handle(HandleError::NotFound(locator.clone()))
    }
}

impl Handle for FakeDom {
    type Element = NodeId;

    fn locate(&self, locator: &Locator) -> Result<NodeId, HandleError> {
        self.query(None, locator)
            .first()
            .copied()
            .ok_or_else(|| HandleError::NotFound(locator.clone()))
    }

    fn attribute(&self, element: &NodeId, name: &str) -> Result<Option<String>, HandleError> {
        self.tick();
        Ok(self.attr(*element, name))
    }

    fn is_present(&self, locator: &Locator) -> Result<bool, HandleError> {
        Ok(!self.query(None, locator).is_empty())
    }

    fn execute(&self, script: &str) -> Result<Value, HandleError> {
        self.tick();
        self.log.borrow_mut().push(format!("execute:{}", script.trim()));
        let mut scripts = self.scripts.borrow_mut();
        match scripts.get_mut(script).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        }) {
            Some(result) => result,
            None => Ok(Value::Null),
        }
    }
}

impl Driver for FakeDom {
    fn navigate(&self, url: &str) -> E2eResult<()> {
        self.log.borrow_mut().push(format!("navigate:{}", url));
        Ok(())
    }

    fn find_all(&self, locator: &Locator) -> E2eResult<Vec<NodeId>> {
        Ok(self.query(None, locator))
    }

    fn find_within(&self, parent: &NodeId, locator: &Locator) -> E2eResult<NodeId> {
        self.query(Some(*parent), locator)
            .first()
            .copied()
            .ok_or_else(|| Self::not_found(locator))
    }

    fn find_all_within(&self, parent: &NodeId, locator: &Locator) -> E2eResult<Vec<NodeId>> {
        Ok(self.query(Some(*parent), locator))
    }

    fn text(&self, element: &NodeId) -> E2eResult<String> {
        Ok(self.nodes.borrow()[*element].text.clone())
    }

    fn property(&self, element: &NodeId, name: &str) -> E2eResult<Value> {
        Ok(self
            .attr(*element, name)
            .map(Value::String)
            .unwrap_or(Value::Null))
    }

    fn click(&self, element: &NodeId) -> E2eResult<()> {
        self.tick();
        self.log.borrow_mut().push(format!("click:{}", element));
        let now = self.ticks.get();
        if let Some(effects) = self.on_click.borrow().get(element) {
            let mut pending = self.pending.borrow_mut();
            for (delay, change) in effects {
                pending.push((now + delay, change.clone()));
            }
        }
        Ok(())
    }

    fn send_keys(&self, element: &NodeId, text: &str) -> E2eResult<()> {
        self.log
            .borrow_mut()
            .push(format!("keys:{}:{}", element, text));
        Ok(())
    }

    fn close(&self) -> E2eResult<()> {
        self.closed.set(true);
        if self.fail_close.get() {
            return Err(E2eError::WebDriver {
                error: "invalid session id".into(),
                message: "session deleted because of page crash".into(),
            });
        }
        Ok(())
    }
}
