pub mod poll;

pub use poll::PollRequest;
