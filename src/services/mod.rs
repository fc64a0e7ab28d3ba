//! Service layer for Simulotto
//!
//! Thin business rules on top of the storage layer. Every mutation goes
//! through a [`Table`](crate::storage::Table), so capture happens there and
//! services never talk to the audit store directly.

pub mod bet;
pub mod draw;
pub mod game_type;
pub mod user;

pub use bet::BetService;
pub use draw::DrawService;
pub use game_type::GameTypeService;
pub use user::UserService;
