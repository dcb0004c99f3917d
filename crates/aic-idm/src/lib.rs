#![doc = include_str!("../README.md")]

mod error;
mod instance;
mod managed_object;
mod user;
mod user_utils;

pub use error::IdmError;
pub use instance::{CloudAmAuth, IdmAuthStrategy, IdmInstance};
pub use managed_object::ManagedObject;
pub use user::User;
pub use user_utils::{
    create_managed_users_instance, create_user_session, delete_user,
    generate_user_session_headers, ManagedUsers, FORCE_AUTH_HEADER,
};
