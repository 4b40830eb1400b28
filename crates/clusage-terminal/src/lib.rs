//! Terminal rendering, input and component shell for clusage
//!
//! This crate provides the double-buffered [`Screen`], the raw key
//! [`decode`](input::decode)r, the [`Component`] model with its list and
//! grid specialisations, and the [`TerminalApp`] shell that stacks
//! components and runs the event loop.

pub mod app;
pub mod component;
pub mod glyphs;
pub mod input;
pub mod raw_mode;
pub mod screen;
pub mod task;
pub mod text;
pub mod theme;

pub use app::{AppCommand, AppContext, AppOptions, TerminalApp};
pub use component::{Component, ComponentBase, Grid, SelectableList};
pub use glyphs::BoxStyle;
pub use input::{KeyEvent, KeyHint, KeyName};
pub use raw_mode::RawMode;
pub use screen::{Screen, Size};
pub use task::{BackgroundLoad, LoadPoll, LoadWaker};
pub use text::Align;
