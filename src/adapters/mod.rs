//! Adapters: concrete implementations of the storage port.
//!
//! | Adapter | Implements         | Connects to           |
//! |---------|--------------------|-----------------------|
//! | `nvs`   | NonVolatileStore   | NVS / in-memory store |

pub mod nvs;
