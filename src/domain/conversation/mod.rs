//! Conversation domain: inbound events, outbound commands, menus, and the
//! pure state-transition function.

mod command;
mod event;
mod menu;
pub mod replies;
mod transition;

pub use command::OutboundCommand;
pub use event::{EmptyMessage, InboundMessage};
pub use menu::{MenuConfigError, MenuId, MenuRegistry, MENUS};
pub use transition::{decide, Step};
