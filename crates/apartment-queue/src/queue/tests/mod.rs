pub(crate) mod common;
mod router;
