//! Session-independent pieces of the `tg` client: the input history ring,
//! submission parsing and the transport boundary the front-end talks to.

pub mod history;
pub mod options;
pub mod submission;
pub mod transport;

pub use history::HistoryBuffer;
pub use options::ClientOptions;
pub use submission::{classify, split_lines, OobCommand, OobError, Submission, OOB_PREFIX};
pub use transport::{Emitter, Subscription, Transport, TransportError, TransportEvent};
