mod lifecycle;
mod session;
mod token;

pub use lifecycle::AuthState;
pub use lifecycle::SessionListener;
pub use lifecycle::TokenLifecycle;
pub use session::RenewalSignal;
pub use session::Session;
pub use session::SessionHandle;
pub use token::TokenStore;
