mod apply;
mod resolve;

pub use self::apply::apply;
pub use self::resolve::{
    resolve, resolve_destination, sanitize, MAX_COLLISION_ATTEMPTS, REASON_EMPTY, REASON_NOOP,
};
