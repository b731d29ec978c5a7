//! Key-user reply engine and thread composer.

pub mod compose;
pub mod dispatcher;
pub mod runner;
pub mod threads;

pub use compose::ThreadComposer;
pub use dispatcher::ResponderSettings;
pub use runner::ReplyRunner;
