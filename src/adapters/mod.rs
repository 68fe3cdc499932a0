//! Adapters: concrete implementations of the port traits for host runs.
//!
//! | Adapter        | Implements         | Connects to                 |
//! |----------------|--------------------|-----------------------------|
//! | `config_file`  | ConfigPort         | JSON file on disk           |
//! | `log_sink`     | EventSink          | `log` facade                |
//! | `sim`          | EnergyDevice       | Simulated store             |
//! |                | OutputPort         | Simulated output bank       |
//! | `time`         | Clock              | `std::time::Instant`        |

pub mod config_file;
pub mod log_sink;
pub mod sim;
pub mod time;
