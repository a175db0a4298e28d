//! GPIO assignments for the bridge board.
//!
//! | Signal       | GPIO | Direction | Notes                          |
//! |--------------|------|-----------|--------------------------------|
//! | Bus SDA      | 1    | bidir     | Peripheral data, ext. pull-up  |
//! | Bus SCL      | 0    | input     | Peripheral clock, ext. pull-up |
//! | Network LED  | 2    | output    | Lit while the station is up    |

/// Peripheral bus data line.
pub const BUS_SDA_GPIO: u8 = 1;

/// Peripheral bus clock line.
pub const BUS_SCL_GPIO: u8 = 0;
