//! Bus pump, indicator, restart and watchdog drivers, plus thread helpers.

pub mod bus_pump;
pub mod indicator;
pub mod reboot;
pub mod task_pin;
pub mod watchdog;
