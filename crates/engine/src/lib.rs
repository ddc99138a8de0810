pub use access::{Role, can_read, can_write, require_read, require_write, role_of};
pub use categories::Category;
pub use commands::{
    CategoryPatch, JoinRequestFilter, Member, MultiPocketSpendFilter, NewCategory, NewPocket,
    NewSpend, PocketDetail, PocketFilter, PocketPatch, SpendFilter, SpendPatch, Transfer,
    TransferCmd,
};
pub use currency::Currency;
pub use cursor::{CursorKey, CursorMeta, CursorPage, CursorRequest, CursorRow};
pub use date_range::{DateRange, parse_time_zone, resolve_date_range};
pub use error::EngineError;
pub use ids::{IdGenerator, SequentialIdGenerator, UuidV7Generator};
pub use idempotency::{
    CachedResponse, DEFAULT_IDEMPOTENCY_CAPACITY, IdempotencyCache, IdempotencyKey, Replay,
};
pub use join_requests::{JoinRequest, JoinRequestStatus};
pub use notify::{LogNotificationPort, Notification, NotificationPort, Notifier, NotifyError};
pub use ops::{Engine, EngineBuilder, POCKET_CURSOR_TYPES, SPEND_CURSOR_TYPES};
pub use pagination::{DEFAULT_PAGE_SIZE, Direction, MAX_PAGE_SIZE, Page, PageRequest};
pub use pockets::Pocket;
pub use spends::{Spend, SpendType, signed_price};
pub use util::MAX_PRICE;

mod access;
mod categories;
mod commands;
mod currency;
mod cursor;
mod date_range;
mod error;
mod idempotency;
mod ids;
mod join_requests;
mod notify;
mod ops;
mod pagination;
mod pocket_members;
mod pockets;
mod spends;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
