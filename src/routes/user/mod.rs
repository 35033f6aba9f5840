mod handler;
mod model;

pub use handler::{
    delete_all, delete_user, get_user, list_users, login, operator_breakdown, register,
    stats, update_user,
};
