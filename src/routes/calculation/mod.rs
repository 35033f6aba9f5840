mod handler;
mod model;

pub use model::UnaryRequest;

pub use handler::{
    all_calculations, ans, chain, compute, filtered_history, history, record_manual,
    unary, user_calculations,
};
