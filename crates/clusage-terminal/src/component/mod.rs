//! Component model
//!
//! A component is a node with focus, visibility and dirty state that can
//! render itself to lines and react to keys. Concrete screens implement
//! [`Component`] and keep their shared state in a [`ComponentBase`].
//!
//! Ownership runs strictly downward: a component owns its children, either
//! boxed in [`ComponentBase::add_child`] or as typed fields adopted with
//! [`ComponentBase::adopt`]. The only upward edge is a weak link between
//! dirty flags, so marking a leaf dirty also dirties every ancestor and the
//! shell knows to repaint, without a reference cycle between owner and
//! owned.

mod grid;
mod list;

pub use grid::Grid;
pub use list::{DEFAULT_VISIBLE_COUNT, SelectableList};

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::app::AppContext;
use crate::input::KeyEvent;

/// Dirty flag with a non-owning link to the parent's flag
#[derive(Debug)]
pub struct DirtyNode {
    dirty: Cell<bool>,
    parent: RefCell<Weak<DirtyNode>>,
}

impl DirtyNode {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            dirty: Cell::new(true),
            parent: RefCell::new(Weak::new()),
        })
    }

    /// Mark this node and every live ancestor dirty
    pub fn mark(&self) {
        self.dirty.set(true);
        let parent = self.parent.borrow().upgrade();
        if let Some(parent) = parent {
            parent.mark();
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn clear(&self) {
        self.dirty.set(false);
    }

    fn set_parent(&self, parent: Option<&Rc<DirtyNode>>) {
        *self.parent.borrow_mut() = parent.map(Rc::downgrade).unwrap_or_default();
    }

    fn has_parent(&self) -> bool {
        self.parent.borrow().upgrade().is_some()
    }
}

/// State every component carries
///
/// A fresh base is visible, unfocused and dirty, so the first render always
/// happens.
pub struct ComponentBase {
    focused: bool,
    visible: bool,
    node: Rc<DirtyNode>,
    children: Vec<Box<dyn Component>>,
}

impl ComponentBase {
    pub fn new() -> Self {
        Self {
            focused: false,
            visible: true,
            node: DirtyNode::new(),
            children: Vec::new(),
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.focused = focused;
        self.mark_dirty();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.mark_dirty();
    }

    pub fn is_dirty(&self) -> bool {
        self.node.is_dirty()
    }

    pub fn mark_dirty(&self) {
        self.node.mark();
    }

    pub fn mark_clean(&self) {
        self.node.clear();
    }

    /// Whether this component's dirty flag propagates to a parent
    pub fn has_parent(&self) -> bool {
        self.node.has_parent()
    }

    /// Take ownership of a boxed child; returns its index
    pub fn add_child(&mut self, child: Box<dyn Component>) -> usize {
        child.base().node.set_parent(Some(&self.node));
        self.children.push(child);
        self.mark_dirty();
        self.children.len() - 1
    }

    /// Release the child at `index`, detaching its dirty link
    pub fn remove_child(&mut self, index: usize) -> Option<Box<dyn Component>> {
        if index >= self.children.len() {
            return None;
        }
        let child = self.children.remove(index);
        child.base().node.set_parent(None);
        self.mark_dirty();
        Some(child)
    }

    /// Link a child held in a typed field so its dirtiness reaches `self`
    pub fn adopt(&self, child: &ComponentBase) {
        child.node.set_parent(Some(&self.node));
        self.mark_dirty();
    }

    pub fn children(&self) -> &[Box<dyn Component>] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Box<dyn Component>] {
        &mut self.children
    }

    /// Destroy and drop every boxed child
    pub fn destroy_children(&mut self) {
        for mut child in self.children.drain(..) {
            child.destroy();
        }
    }
}

impl Default for ComponentBase {
    fn default() -> Self {
        Self::new()
    }
}

/// A renderable, key-handling UI node
pub trait Component {
    fn base(&self) -> &ComponentBase;

    fn base_mut(&mut self) -> &mut ComponentBase;

    /// The component's current frame, one string per terminal row
    fn render(&self) -> Vec<String>;

    /// React to a key; `true` means the key was consumed
    fn handle_key(&mut self, key: &KeyEvent, ctx: &mut AppContext) -> bool;

    /// Called once when the component is pushed onto the shell
    fn init(&mut self, _ctx: &mut AppContext) {}

    /// Release resources; the default destroys owned children
    fn destroy(&mut self) {
        self.base_mut().destroy_children();
    }

    /// Apply finished background work; `true` if anything changed
    fn poll_updates(&mut self) -> bool {
        false
    }

    /// Key help shown on the footer row while this component is on top
    fn footer(&self) -> Option<String> {
        None
    }

    fn is_dirty(&self) -> bool {
        self.base().is_dirty()
    }

    fn mark_dirty(&self) {
        self.base().mark_dirty();
    }

    fn mark_clean(&self) {
        self.base().mark_clean();
    }

    fn is_focused(&self) -> bool {
        self.base().is_focused()
    }

    fn set_focus(&mut self, focused: bool) {
        self.base_mut().set_focus(focused);
    }

    fn is_visible(&self) -> bool {
        self.base().is_visible()
    }

    fn set_visible(&mut self, visible: bool) {
        self.base_mut().set_visible(visible);
    }
}
