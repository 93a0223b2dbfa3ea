pub mod channel;
pub mod port;
pub mod registry;

pub use channel::{Channel, Token};
pub use port::{ReadPort, WritePort};
pub use registry::{ChannelRegistry, ChannelSummary, ReaderConfig, WriterConfig};
