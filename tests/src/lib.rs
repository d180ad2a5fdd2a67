pub mod framework;

pub use mock_network::{MockControl, MockNotifier, MockTransport, RecordingCapture};
