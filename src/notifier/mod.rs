pub mod directory;
pub mod dispatcher;
pub mod events;
pub mod push;
pub mod rules;
pub mod traits;

pub use directory::StoreUserDirectory;
pub use dispatcher::{DispatchReport, NotificationDispatcher, Recipient};
pub use events::DomainEvent;
pub use push::{DryRunPushSender, HttpPushSender};
pub use traits::{PushMessage, PushSender, UserDirectory};
