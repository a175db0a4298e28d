//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements    | Connects to                 |
//! |-------------|---------------|-----------------------------|
//! | `requests`  | RequestPort   | Framing link outbound queue |
//! | `wifi`      | NetworkPort   | ESP-IDF WiFi STA            |
//! | `i2c_slave` | BusHardware   | ESP-IDF I2C slave driver    |
//! | `http`      | (inbound)     | ESP-IDF HTTP server         |

pub mod http;
pub mod i2c_slave;
pub mod requests;
pub mod wifi;
