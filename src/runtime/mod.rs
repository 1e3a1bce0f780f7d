//! Runtime plumbing: keyboard loop, cancellation, timeouts and background tickers.

pub mod cancel;
pub mod input;
pub mod ticker;
pub mod timeout;

pub use cancel::CancelToken;
pub use input::{Input, InputConfig, KeyPressEventArgs};
pub use ticker::Ticker;
pub use timeout::with_prompt_timeout;
