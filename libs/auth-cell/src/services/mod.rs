pub mod gate;
pub mod users;

pub use gate::AccessGate;
pub use users::UserService;
